use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub twilio: TwilioConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub referral: ReferralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentConfig {
    /// Shared secret the payment collaborator sends in `X-Webhook-Secret`
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Allowed draw count besides a single draw
    pub bulk_size: u32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self { bulk_size: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub code_length: usize,
    pub code_ttl_minutes: i64,
    pub rate_limit_window_minutes: i64,
    pub rate_limit_max: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            code_ttl_minutes: 5,
            rate_limit_window_minutes: 60,
            rate_limit_max: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralConfig {
    pub code_length: usize,
    pub max_code_attempts: u32,
    /// Miles credited to the inviter when the invitee verifies a phone
    pub phone_verified_miles: i64,
    /// Miles credited to the inviter on the invitee's first charge
    pub first_charge_miles: i64,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            code_length: 8,
            max_code_attempts: 10,
            phone_verified_miles: 100,
            first_charge_miles: 500,
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Without a config file everything comes from the environment
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    twilio: TwilioConfig {
                        account_sid: get_env("TWILIO_ACCOUNT_SID").unwrap_or_default(),
                        auth_token: get_env("TWILIO_AUTH_TOKEN").unwrap_or_default(),
                        from_phone: get_env("TWILIO_FROM_PHONE").unwrap_or_default(),
                    },
                    payment: PaymentConfig {
                        webhook_secret: get_env("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
                    },
                    draw: DrawConfig::default(),
                    sms: SmsConfig::default(),
                    referral: ReferralConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    // Environment wins even when the file exists
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = v;
        }
        if let Ok(v) = env::var("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = v;
        }
        if let Ok(v) = env::var("TWILIO_FROM_PHONE") {
            self.twilio.from_phone = v;
        }
        if let Ok(v) = env::var("PAYMENT_WEBHOOK_SECRET") {
            self.payment.webhook_secret = v;
        }
        if let Ok(v) = env::var("DRAW_BULK_SIZE")
            && let Ok(n) = v.parse()
        {
            self.draw.bulk_size = n;
        }
        if let Ok(v) = env::var("SMS_CODE_TTL_MINUTES")
            && let Ok(n) = v.parse()
        {
            self.sms.code_ttl_minutes = n;
        }
        if let Ok(v) = env::var("SMS_RATE_LIMIT_MAX")
            && let Ok(n) = v.parse()
        {
            self.sms.rate_limit_max = n;
        }
        if let Ok(v) = env::var("REFERRAL_PHONE_VERIFIED_MILES")
            && let Ok(n) = v.parse()
        {
            self.referral.phone_verified_miles = n;
        }
        if let Ok(v) = env::var("REFERRAL_FIRST_CHARGE_MILES")
            && let Ok(n) = v.parse()
        {
            self.referral.first_charge_miles = n;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
