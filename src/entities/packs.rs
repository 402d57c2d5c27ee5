use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PackStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "sold_out")]
    SoldOut,
}

impl std::fmt::Display for PackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackStatus::Draft => write!(f, "draft"),
            PackStatus::Active => write!(f, "active"),
            PackStatus::SoldOut => write!(f, "sold_out"),
        }
    }
}

/// 卡包
/// - price: 单抽价格（点数）
/// - remaining_stock: 剩余可抽数量，0 时状态变为 sold_out
/// - per_user_limit: 每个用户最多抽取次数 (NULL=不限)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "packs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub title: String,
    pub price: i64,
    pub total_stock: i64,
    pub remaining_stock: i64,
    pub status: PackStatus,
    pub per_user_limit: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 是否处于可抽取状态（状态为 active 且在开放时间窗口内）
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        if self.status != PackStatus::Active {
            return false;
        }
        if let Some(start) = self.starts_at
            && now < start
        {
            return false;
        }
        if let Some(end) = self.ends_at
            && now >= end
        {
            return false;
        }
        true
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
