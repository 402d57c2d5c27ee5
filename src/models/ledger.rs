use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{LedgerCategory, balance_transaction_entity, mile_transaction_entity};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LedgerQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// 流水条目（点数与里程共用）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerEntryResponse {
    pub id: i64,
    pub amount: i64,
    pub balance_after: i64,
    pub category: LedgerCategory,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<balance_transaction_entity::Model> for LedgerEntryResponse {
    fn from(m: balance_transaction_entity::Model) -> Self {
        LedgerEntryResponse {
            id: m.id,
            amount: m.amount,
            balance_after: m.balance_after,
            category: m.category,
            description: m.description,
            reference_id: m.reference_id,
            created_at: m.created_at,
        }
    }
}

impl From<mile_transaction_entity::Model> for LedgerEntryResponse {
    fn from(m: mile_transaction_entity::Model) -> Self {
        LedgerEntryResponse {
            id: m.id,
            amount: m.amount,
            balance_after: m.balance_after,
            category: m.category,
            description: m.description,
            reference_id: m.reference_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletResponse {
    pub balance: i64,
    pub miles: i64,
    pub lifetime_charged: i64,
    pub reward_tier: Option<String>,
}
