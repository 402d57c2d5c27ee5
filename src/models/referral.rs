use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReferralCodeResponse {
    #[schema(example = "K7M2QXPA")]
    pub referral_code: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LinkInviteeRequest {
    #[schema(example = "K7M2QXPA")]
    pub referral_code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteLinkResponse {
    pub inviter_id: i64,
    pub invitee_id: i64,
}
