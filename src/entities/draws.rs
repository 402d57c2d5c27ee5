use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽取记录（不可变）
/// - batch_id: 同一次请求（单抽或连抽）的所有记录共用
/// - is_trial: 试抽，不影响库存、余额与流水
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "draws")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub user_id: i64,
    pub pack_id: i64,
    pub pack_prize_id: i64,
    pub prize_id: i64,
    pub batch_id: Uuid,
    pub unit_price: i64,
    pub is_trial: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
