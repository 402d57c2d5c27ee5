use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static E164: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+[1-9]\d{7,14}$").expect("valid E.164 pattern")
});

/// 验证 E.164 格式手机号
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !E164.is_match(phone) {
        return Err(AppError::ValidationError(
            "Phone number must be in E.164 format (+<country><number>)".to_string(),
        ));
    }
    Ok(())
}

/// 去掉空格、横线、括号
pub fn normalize_phone(phone: &str) -> String {
    let mut out = String::with_capacity(phone.len());
    for (i, c) in phone.trim().chars().enumerate() {
        if c.is_ascii_digit() || (i == 0 && c == '+') {
            out.push(c);
        }
    }
    out
}
