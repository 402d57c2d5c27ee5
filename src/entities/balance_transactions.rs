use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 流水类别，点数流水与里程流水共用
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerCategory {
    #[sea_orm(string_value = "CHARGE")]
    Charge,
    #[sea_orm(string_value = "DRAW")]
    Draw,
    #[sea_orm(string_value = "EXCHANGE")]
    Exchange,
    #[sea_orm(string_value = "BONUS")]
    Bonus,
    #[sea_orm(string_value = "MILE_EXCHANGE")]
    MileExchange,
    #[sea_orm(string_value = "REFERRAL")]
    Referral,
}

impl std::fmt::Display for LedgerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerCategory::Charge => write!(f, "CHARGE"),
            LedgerCategory::Draw => write!(f, "DRAW"),
            LedgerCategory::Exchange => write!(f, "EXCHANGE"),
            LedgerCategory::Bonus => write!(f, "BONUS"),
            LedgerCategory::MileExchange => write!(f, "MILE_EXCHANGE"),
            LedgerCategory::Referral => write!(f, "REFERRAL"),
        }
    }
}

/// 点数流水（只追加）
/// - amount: 有符号，扣减为负
/// - balance_after: 记录时的余额快照，不做回算
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "balance_transactions")]
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
