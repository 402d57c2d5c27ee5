use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 邀请关系，每个被邀请人只有一条
/// 两个奖励时间戳各自只会被设置一次
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "invite_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: i64,
    pub inviter_id: i64,
    pub invitee_id: i64,
    pub phone_reward_at: Option<DateTime<Utc>>,
    pub first_charge_reward_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
