//! # JWT sessions
//!
//! HS256-signed session tokens. `sub` carries the user id.

use chrono::{Duration, Utc};
use domains::{DomainError, Result, TokenIssuer};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(DomainError::internal)
    }

    fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| DomainError::Unauthenticated)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| DomainError::Unauthenticated)
    }
}
