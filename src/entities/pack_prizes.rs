use sea_orm::entity::prelude::*;

use crate::utils::Weighted;

/// 卡包与奖品的关联（奖池槽位）
/// - weight: 相对权重，决定抽中概率
/// - remaining_quantity: 剩余数量，为 0 时不参与抽取但仍用于展示
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "pack_prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub pack_id: i64,
    pub prize_id: i64,
    pub weight: i32,
    pub total_quantity: i64,
    pub remaining_quantity: i64,
    pub sort_order: i32,
}

impl Model {
    pub fn is_eligible(&self) -> bool {
        self.weight > 0 && self.remaining_quantity > 0
    }
}

impl Weighted for Model {
    fn weight(&self) -> u64 {
        self.weight.max(0) as u64
    }

    fn remaining(&self) -> i64 {
        self.remaining_quantity
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
