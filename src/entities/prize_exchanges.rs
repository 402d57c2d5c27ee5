use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 奖品兑换点数记录，draw_id 唯一保证同一抽取只能兑换一次
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "prize_exchanges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub user_id: i64,
    #[sea_orm(unique)]
    pub draw_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
