pub mod charge;
pub mod config_version;
pub mod draw;
pub mod exchange;
pub mod ledger;
pub mod pagination;
pub mod referral;
pub mod reward;
pub mod tenant;
pub mod user;
pub mod verification_code;

pub use charge::*;
pub use config_version::*;
pub use draw::*;
pub use exchange::*;
pub use ledger::*;
pub use pagination::*;
pub use referral::*;
pub use reward::*;
pub use tenant::*;
pub use user::*;
pub use verification_code::*;
