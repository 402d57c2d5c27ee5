use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ConfigDomain {
    #[sea_orm(string_value = "rank_table")]
    RankTable,
    #[sea_orm(string_value = "home_banners")]
    HomeBanners,
    #[sea_orm(string_value = "home_events")]
    HomeEvents,
    #[sea_orm(string_value = "mile_rewards")]
    MileRewards,
    #[sea_orm(string_value = "feature_flags")]
    FeatureFlags,
    #[sea_orm(string_value = "content_overrides")]
    ContentOverrides,
}

impl std::fmt::Display for ConfigDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigDomain::RankTable => write!(f, "rank_table"),
            ConfigDomain::HomeBanners => write!(f, "home_banners"),
            ConfigDomain::HomeEvents => write!(f, "home_events"),
            ConfigDomain::MileRewards => write!(f, "mile_rewards"),
            ConfigDomain::FeatureFlags => write!(f, "feature_flags"),
            ConfigDomain::ContentOverrides => write!(f, "content_overrides"),
        }
    }
}

/// 配置版本（只追加，创建后不可修改）
/// (tenant_id, domain, version) 唯一，version 从 1 开始连续递增
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "config_versions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub domain: ConfigDomain,
    pub version: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: Json,
    pub published_at: DateTime<Utc>,
    pub published_by: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
