use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::user_entity;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i64,
    pub display_name: String,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub balance: i64,
    pub miles: i64,
    pub lifetime_charged: i64,
    pub reward_tier: Option<String>,
    pub referral_code: Option<String>,
    /// 已绑定的被邀请人数
    pub total_invitees: i64,
}

impl From<user_entity::Model> for UserProfileResponse {
    fn from(m: user_entity::Model) -> Self {
        UserProfileResponse {
            id: m.id,
            display_name: m.display_name,
            phone: m.phone,
            phone_verified: m.phone_verified_at.is_some(),
            terms_accepted_at: m.terms_accepted_at,
            balance: m.balance,
            miles: m.miles,
            lifetime_charged: m.lifetime_charged,
            reward_tier: m.reward_tier,
            referral_code: m.referral_code,
            total_invitees: 0,
        }
    }
}
