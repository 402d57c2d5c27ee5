use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SendCodeRequest {
    #[schema(example = "+12345678901")]
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendCodeResponse {
    pub expires_in: i64, // seconds
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VerifyCodeRequest {
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub phone: String,
    pub verified_at: chrono::DateTime<chrono::Utc>,
    /// 本次给邀请人发放的里程
    pub referral_miles: i64,
}
