use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 用户（按租户隔离）
/// - balance: 可用于抽卡的点数余额
/// - miles: 里程（积分）余额
/// - lifetime_charged: 累计充值金额，用于计算会员等级
/// - reward_tier: 当前等级代码 (reward_tier_settings.code)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub display_name: String,
    pub phone: Option<String>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub balance: i64,
    pub miles: i64,
    pub lifetime_charged: i64,
    pub reward_tier: Option<String>,
    pub referral_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
