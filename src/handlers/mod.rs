pub mod admin;
pub mod draw;
pub mod exchange;
pub mod referral;
pub mod user;
pub mod verification;
pub mod webhook;

pub use admin::admin_config;
pub use draw::draw_config;
pub use exchange::exchange_config;
pub use referral::referral_config;
pub use user::user_config;
pub use verification::verification_config;
pub use webhook::webhook_config;

use crate::error::AppError;
use crate::models::AuthContext;
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中获取身份信息（中间件在鉴权后注入）
pub(crate) fn auth_from_request(req: &HttpRequest) -> Result<AuthContext, AppError> {
    req.extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
