use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

pub use super::balance_transactions::LedgerCategory;

/// 里程流水，结构与点数流水一致
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "mile_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub balance_after: i64,
    pub category: LedgerCategory,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
