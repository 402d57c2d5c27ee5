use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::mile_reward_entity;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeExchangeResponse {
    pub draw_id: i64,
    pub credited: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MileExchangeResponse {
    pub reward_id: i64,
    pub miles_spent: i64,
    pub credited: i64,
    pub miles: i64,
    pub balance: i64,
}

/// mile_rewards 配置域的快照条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MileRewardSnapshot {
    pub code: String,
    pub name: String,
    pub required_miles: i64,
    pub credit_amount: i64,
    pub is_active: bool,
}

impl From<&mile_reward_entity::Model> for MileRewardSnapshot {
    fn from(m: &mile_reward_entity::Model) -> Self {
        MileRewardSnapshot {
            code: m.code.clone(),
            name: m.name.clone(),
            required_miles: m.required_miles,
            credit_amount: m.credit_amount,
            is_active: m.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MileRewardCatalogSnapshot {
    pub rewards: Vec<MileRewardSnapshot>,
}

/// 用户可见的里程兑换项
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MileRewardResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub required_miles: i64,
    pub credit_amount: i64,
}

impl From<mile_reward_entity::Model> for MileRewardResponse {
    fn from(m: mile_reward_entity::Model) -> Self {
        MileRewardResponse {
            id: m.id,
            code: m.code,
            name: m.name,
            required_miles: m.required_miles,
            credit_amount: m.credit_amount,
        }
    }
}
