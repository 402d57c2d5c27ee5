use crate::error::AppError;
use crate::models::{AuthContext, TenantContext};
use crate::utils::{Claims, JwtService, ROLE_ADMIN};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            // 完全匹配的公开路径
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
            ],
            // 前缀匹配的公开路径（webhook 使用共享密钥单独校验）
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/webhook/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// 管理接口前缀，需要 admin 角色
const ADMIN_PREFIX: &str = "/api/v1/admin";

fn auth_context(claims: &Claims) -> Result<AuthContext, AppError> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
    Ok(AuthContext {
        user_id,
        tenant: TenantContext::new(claims.tenant_id),
        is_admin: claims.role == ROLE_ADMIN,
    })
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS || self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let Some(token) = bearer_token(&req) else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let ctx = match self
            .jwt_service
            .verify_access_token(token)
            .and_then(|claims| auth_context(&claims))
        {
            Ok(ctx) => ctx,
            Err(e) => {
                log::warn!("rejected access token on {}: {}", req.path(), e);
                let error = AppError::AuthError("Invalid access token".to_string());
                return Box::pin(async move { Err(error.into()) });
            }
        };

        if req.path().starts_with(ADMIN_PREFIX) && !ctx.is_admin {
            return Box::pin(async move { Err(AppError::PermissionDenied.into()) });
        }

        // 将身份与租户信息添加到请求扩展中
        req.extensions_mut().insert(ctx);
        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ROLE_USER;

    #[test]
    fn public_paths_skip_authentication() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/webhook/charges/completed"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));
        assert!(!paths.is_public_path("/api/v1/me/wallet"));
        assert!(!paths.is_public_path("/api/v1/admin/config/history"));
    }

    #[test]
    fn claims_map_to_auth_context() {
        let claims = Claims {
            sub: "42".into(),
            tenant_id: 3,
            role: ROLE_ADMIN.into(),
            exp: 0,
            iat: 0,
        };
        let ctx = auth_context(&claims).unwrap();
        assert_eq!(ctx.user_id, 42);
        assert_eq!(ctx.tenant, TenantContext::new(3));
        assert!(ctx.is_admin);

        let bad = Claims {
            sub: "abc".into(),
            role: ROLE_USER.into(),
            ..claims
        };
        assert!(auth_context(&bad).is_err());
    }
}
