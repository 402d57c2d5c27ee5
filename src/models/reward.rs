use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::reward_tier_entity;

/// 等级配置的部分更新，只修改提供的字段
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RewardTierPatch {
    pub name: Option<String>,
    pub threshold: Option<i64>,
    pub credit_return_bp: Option<i32>,
    pub mile_return_bp: Option<i32>,
    pub bonus_amount: Option<i64>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl RewardTierPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.threshold.is_none()
            && self.credit_return_bp.is_none()
            && self.mile_return_bp.is_none()
            && self.bonus_amount.is_none()
            && self.sort_order.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RewardTierResponse {
    pub code: String,
    pub name: String,
    pub threshold: i64,
    pub credit_return_bp: i32,
    pub mile_return_bp: i32,
    pub bonus_amount: i64,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<reward_tier_entity::Model> for RewardTierResponse {
    fn from(m: reward_tier_entity::Model) -> Self {
        RewardTierResponse {
            code: m.code,
            name: m.name,
            threshold: m.threshold,
            credit_return_bp: m.credit_return_bp,
            mile_return_bp: m.mile_return_bp,
            bonus_amount: m.bonus_amount,
            sort_order: m.sort_order,
            is_active: m.is_active,
        }
    }
}

/// rank_table 配置域的快照内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankTableSnapshot {
    pub tiers: Vec<RankTierSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankTierSnapshot {
    pub code: String,
    pub name: String,
    pub threshold: i64,
    pub credit_return_bp: i32,
    pub mile_return_bp: i32,
    pub bonus_amount: i64,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<&reward_tier_entity::Model> for RankTierSnapshot {
    fn from(m: &reward_tier_entity::Model) -> Self {
        RankTierSnapshot {
            code: m.code.clone(),
            name: m.name.clone(),
            threshold: m.threshold,
            credit_return_bp: m.credit_return_bp,
            mile_return_bp: m.mile_return_bp,
            bonus_amount: m.bonus_amount,
            sort_order: m.sort_order,
            is_active: m.is_active,
        }
    }
}

/// 单个用户重新计算的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserRecalcOutcome {
    pub user_id: i64,
    pub previous_tier: Option<String>,
    pub tier: Option<String>,
    /// 本次新增发放的奖励点数（含补差）
    pub bonus_credited: i64,
}

impl UserRecalcOutcome {
    pub fn tier_changed(&self) -> bool {
        self.previous_tier != self.tier
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecalculationFailure {
    pub user_id: i64,
    pub reason: String,
}

/// 全租户重新计算汇总，单个用户失败不会中断批处理
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecalculationSummary {
    pub processed: u64,
    pub tier_changes: u64,
    pub bonus_credited: i64,
    pub failures: Vec<RecalculationFailure>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TierUpdateResponse {
    pub tier: RewardTierResponse,
    pub published_version: i32,
    pub recalculation: RecalculationSummary,
}
