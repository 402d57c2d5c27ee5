use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use crate::external::SmsSender;
use async_trait::async_trait;
use reqwest::Client;

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.account_sid.is_empty()
            && !self.config.auth_token.is_empty()
            && !self.config.from_phone.is_empty()
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

fn verification_body(code: &str, ttl_minutes: i64) -> String {
    format!("Your verification code is: {code}, valid for {ttl_minutes} minutes.")
}

#[async_trait]
impl SmsSender for TwilioService {
    async fn send_verification_code(
        &self,
        phone: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> AppResult<()> {
        let body = verification_body(code, ttl_minutes);
        let params = [
            ("To", phone),
            ("From", self.config.from_phone.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Verification code SMS sent successfully: {}", phone);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!(
                "Verification code SMS failed to send: {}, Error: {}",
                phone,
                error_text
            );
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {}",
                error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_code_and_ttl() {
        let body = verification_body("042917", 5);
        assert!(body.contains("042917"));
        assert!(body.contains("5 minutes"));
    }

    #[test]
    fn unconfigured_account_is_detected() {
        assert!(!TwilioService::new(TwilioConfig::default()).is_configured());
        let svc = TwilioService::new(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            from_phone: "+15550001111".into(),
        });
        assert!(svc.is_configured());
        assert!(svc.messages_url().contains("/Accounts/AC123/"));
    }
}
