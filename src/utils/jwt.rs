use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub tenant_id: i64,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Tokens are issued by the identity service; this side only needs the
/// shared secret to verify them.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
        }
    }

    pub fn generate_access_token(
        &self,
        user_id: i64,
        tenant_id: i64,
        role: &str,
    ) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            tenant_id,
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)?;

        if claims.role != ROLE_USER && claims.role != ROLE_ADMIN {
            return Err(AppError::AuthError("Unknown token role".to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_tenant_and_role() {
        let svc = JwtService::new("secret", 60);
        let token = svc.generate_access_token(42, 7, ROLE_ADMIN).unwrap();
        let claims = svc.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.tenant_id, 7);
        assert_eq!(claims.role, ROLE_ADMIN);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = JwtService::new("a", 60)
            .generate_access_token(1, 1, ROLE_USER)
            .unwrap();
        assert!(JwtService::new("b", 60).verify_access_token(&token).is_err());
    }
}
