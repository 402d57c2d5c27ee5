use serde::{Deserialize, Serialize};

/// 显式传递的租户上下文，所有服务调用都必须携带
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: i64,
}

impl TenantContext {
    pub fn new(tenant_id: i64) -> Self {
        Self { tenant_id }
    }
}

/// 鉴权中间件注入到请求扩展中的身份信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub tenant: TenantContext,
    pub is_admin: bool,
}
