use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 会员等级配置
/// - code: 稳定的等级代码，发放记录与快照均以此匹配
/// - threshold: 累计充值门槛，最低等级为 0
/// - credit_return_bp / mile_return_bp: 充值返还比例 (basis points, 100% = 10000)
/// - bonus_amount: 升级一次性奖励点数
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "reward_tier_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub code: String,
    pub name: String,
    pub threshold: i64,
    pub credit_return_bp: i32,
    pub mile_return_bp: i32,
    pub bonus_amount: i64,
    pub sort_order: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
