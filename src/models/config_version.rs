use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ConfigDomain, config_version_entity};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PublishConfigRequest {
    /// 当前配置的完整快照
    #[schema(value_type = Object)]
    pub snapshot: serde_json::Value,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RollbackConfigRequest {
    pub target_version: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ConfigHistoryQuery {
    pub domain: Option<ConfigDomain>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigVersionResponse {
    pub domain: ConfigDomain,
    pub version: i32,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
    pub published_by: String,
    pub description: Option<String>,
}

impl From<config_version_entity::Model> for ConfigVersionResponse {
    fn from(m: config_version_entity::Model) -> Self {
        ConfigVersionResponse {
            domain: m.domain,
            version: m.version,
            payload: m.payload,
            published_at: m.published_at,
            published_by: m.published_by,
            description: m.description,
        }
    }
}
