use rand::Rng;
use rand::rngs::OsRng;

/// 推荐码字符集（去掉 0/O/1/I 等易混淆字符）
pub const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 生成固定长度的数字验证码
pub fn generate_numeric_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// 生成推荐码候选值，唯一性由调用方检查
pub fn generate_referral_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| REFERRAL_ALPHABET[rng.gen_range(0..REFERRAL_ALPHABET.len())] as char)
        .collect()
}
