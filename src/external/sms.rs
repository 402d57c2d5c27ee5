use crate::error::AppResult;
use async_trait::async_trait;

/// 短信发送通道
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_verification_code(&self, phone: &str, code: &str, ttl_minutes: i64)
    -> AppResult<()>;
}

/// 不实际发送，只写日志；未配置 Twilio 时使用
#[derive(Debug, Clone, Default)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_verification_code(
        &self,
        phone: &str,
        _code: &str,
        ttl_minutes: i64,
    ) -> AppResult<()> {
        log::warn!(
            "SMS transport not configured, verification code for {} not delivered (ttl {}m)",
            phone,
            ttl_minutes
        );
        Ok(())
    }
}
