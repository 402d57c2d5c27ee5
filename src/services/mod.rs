pub mod charge_service;
pub mod config_version_service;
pub mod draw_service;
pub mod exchange_service;
pub mod ledger_service;
pub mod referral_service;
pub mod reward_service;
pub mod user_service;
pub mod verification_service;

pub use charge_service::*;
pub use config_version_service::ConfigVersionService;
pub use draw_service::*;
pub use exchange_service::ExchangeService;
pub use ledger_service::LedgerService;
pub use referral_service::ReferralService;
pub use reward_service::RewardService;
pub use user_service::*;
pub use verification_service::*;
