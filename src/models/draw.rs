use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{PackStatus, draw_entity, pack_prize_entity};

/// 抽取请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawRequest {
    /// 抽取次数：1 或配置的连抽数
    #[schema(example = 1)]
    pub count: u32,
    /// 试抽：不扣点数、不减库存
    #[serde(default)]
    pub trial: bool,
}

/// 单次抽中的奖品
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WonPrize {
    pub draw_id: i64,
    pub prize_id: i64,
    pub prize_name: String,
    pub exchange_value: i64,
}

/// 抽取结算结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawSettlementResponse {
    pub batch_id: Uuid,
    pub is_trial: bool,
    /// 按抽取顺序排列
    pub prizes: Vec<WonPrize>,
    pub remaining_stock: i64,
    pub pack_status: PackStatus,
    pub balance: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawRecordQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawRecordResponse {
    pub id: i64,
    pub pack_id: i64,
    pub prize_id: i64,
    pub batch_id: Uuid,
    pub unit_price: i64,
    pub is_trial: bool,
    pub created_at: DateTime<Utc>,
}

impl From<draw_entity::Model> for DrawRecordResponse {
    fn from(m: draw_entity::Model) -> Self {
        DrawRecordResponse {
            id: m.id,
            pack_id: m.pack_id,
            prize_id: m.prize_id,
            batch_id: m.batch_id,
            unit_price: m.unit_price,
            is_trial: m.is_trial,
            created_at: m.created_at,
        }
    }
}

/// 奖池槽位（包含已抽完的槽位，用于展示）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PackSlotResponse {
    pub id: i64,
    pub prize_id: i64,
    pub weight: i32,
    pub total_quantity: i64,
    pub remaining_quantity: i64,
    pub selectable: bool,
}

impl From<pack_prize_entity::Model> for PackSlotResponse {
    fn from(m: pack_prize_entity::Model) -> Self {
        let selectable = m.is_eligible();
        PackSlotResponse {
            id: m.id,
            prize_id: m.prize_id,
            weight: m.weight,
            total_quantity: m.total_quantity,
            remaining_quantity: m.remaining_quantity,
            selectable,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PackResponse {
    pub id: i64,
    pub title: String,
    pub price: i64,
    pub total_stock: i64,
    pub remaining_stock: i64,
    pub status: PackStatus,
}

impl From<crate::entities::pack_entity::Model> for PackResponse {
    fn from(m: crate::entities::pack_entity::Model) -> Self {
        PackResponse {
            id: m.id,
            title: m.title,
            price: m.price,
            total_stock: m.total_stock,
            remaining_stock: m.remaining_stock,
            status: m.status,
        }
    }
}
