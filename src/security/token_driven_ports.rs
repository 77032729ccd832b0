use crate::domain::auth::driven_ports::{SessionTokens, TokenRejection};
use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SESSION_VALIDITY_DAYS: i64 = 30;

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies HS256 session tokens whose subject is the user's ID
#[derive(Clone)]
pub struct JwtSessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl JwtSessionTokens {
    pub fn new(secret: &str) -> JwtSessionTokens {
        Self::with_validity(secret, Duration::days(SESSION_VALIDITY_DAYS))
    }

    pub fn with_validity(secret: &str, validity: Duration) -> JwtSessionTokens {
        JwtSessionTokens {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        }
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue_token(&self, user_id: i32) -> Result<String, anyhow::Error> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("signing session token")
    }

    fn verify_token(&self, token: &str) -> Result<i32, TokenRejection> {
        let decoded = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            _ => {
                debug!("Rejected session token: {err}");
                TokenRejection::Invalid
            }
        })?;

        decoded
            .claims
            .sub
            .parse()
            .map_err(|_| TokenRejection::Invalid)
    }
}
