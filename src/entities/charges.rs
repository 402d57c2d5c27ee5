use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

pub const CHARGE_METADATA_VERSION: u16 = 1;

/// Typed side record kept next to a charge.
///
/// Always written through [`ChargeMetadata::apply`]; fields absent from a
/// patch keep their stored value.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct ChargeMetadata {
    pub schema_version: u16,
    pub plan_name: Option<String>,
    pub external_status: Option<String>,
    pub failure_reason: Option<String>,
    pub bonus_credits: Option<i64>,
    pub accrued_miles: Option<i64>,
}

impl Default for ChargeMetadata {
    fn default() -> Self {
        Self {
            schema_version: CHARGE_METADATA_VERSION,
            plan_name: None,
            external_status: None,
            failure_reason: None,
            bonus_credits: None,
            accrued_miles: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChargeMetadataPatch {
    pub plan_name: Option<String>,
    pub external_status: Option<String>,
    pub failure_reason: Option<String>,
    pub bonus_credits: Option<i64>,
    pub accrued_miles: Option<i64>,
}

impl ChargeMetadata {
    pub fn apply(mut self, patch: ChargeMetadataPatch) -> Self {
        if let Some(v) = patch.plan_name {
            self.plan_name = Some(v);
        }
        if let Some(v) = patch.external_status {
            self.external_status = Some(v);
        }
        if let Some(v) = patch.failure_reason {
            self.failure_reason = Some(v);
        }
        if let Some(v) = patch.bonus_credits {
            self.bonus_credits = Some(v);
        }
        if let Some(v) = patch.accrued_miles {
            self.accrued_miles = Some(v);
        }
        self.schema_version = CHARGE_METADATA_VERSION;
        self
    }
}

/// 外部支付结算记录，(tenant_id, external_payment_id) 唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "charges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub external_payment_id: String,
    pub amount: i64,
    pub credit_amount: i64,
    pub status: ChargeStatus,
    #[sea_orm(column_type = "Json")]
    pub metadata: ChargeMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
