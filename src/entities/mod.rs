pub mod balance_transactions;
pub mod charge_plans;
pub mod charges;
pub mod config_versions;
pub mod draws;
pub mod invite_links;
pub mod mile_rewards;
pub mod mile_transactions;
pub mod pack_prizes;
pub mod packs;
pub mod phone_verification_codes;
pub mod prize_exchanges;
pub mod prizes;
pub mod reward_tier_settings;
pub mod user_rank_bonus_grants;
pub mod users;

pub use balance_transactions as balance_transaction_entity;
pub use balance_transactions::LedgerCategory;
pub use charge_plans as charge_plan_entity;
pub use charges as charge_entity;
pub use charges::{ChargeMetadata, ChargeMetadataPatch, ChargeStatus};
pub use config_versions as config_version_entity;
pub use config_versions::ConfigDomain;
pub use draws as draw_entity;
pub use invite_links as invite_link_entity;
pub use mile_rewards as mile_reward_entity;
pub use mile_transactions as mile_transaction_entity;
pub use pack_prizes as pack_prize_entity;
pub use packs as pack_entity;
pub use packs::PackStatus;
pub use phone_verification_codes as phone_verification_code_entity;
pub use prize_exchanges as prize_exchange_entity;
pub use prizes as prize_entity;
pub use reward_tier_settings as reward_tier_entity;
pub use user_rank_bonus_grants as rank_bonus_grant_entity;
pub use users as user_entity;
