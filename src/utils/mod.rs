pub mod code_generator;
pub mod jwt;
pub mod phone;
pub mod selector;

pub use code_generator::{REFERRAL_ALPHABET, generate_numeric_code, generate_referral_code};
pub use jwt::*;
pub use phone::*;
pub use selector::{Weighted, pick, pick_secure, pick_with_roll, total_weight};
