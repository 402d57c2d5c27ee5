use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ChargeMetadata, ChargeStatus, charge_entity};

/// 支付方回调内容
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChargeCallback {
    pub tenant_id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    #[schema(example = "pi_3PqZ8d2eZvKYlo2C0abc")]
    pub external_payment_id: String,
    /// 失败回调时的原因
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChargeResponse {
    pub id: i64,
    pub external_payment_id: String,
    pub amount: i64,
    pub credit_amount: i64,
    pub status: ChargeStatus,
    pub metadata: ChargeMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<charge_entity::Model> for ChargeResponse {
    fn from(m: charge_entity::Model) -> Self {
        ChargeResponse {
            id: m.id,
            external_payment_id: m.external_payment_id,
            amount: m.amount,
            credit_amount: m.credit_amount,
            status: m.status,
            metadata: m.metadata,
            created_at: m.created_at,
        }
    }
}
