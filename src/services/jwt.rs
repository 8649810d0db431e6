use crate::config::JwtConfig;
use crate::error::{Error, Result};
use crate::models::users::{User, UserType};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Claims of the token issued by `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginClaims {
    /// Subject - user id
    pub sub: String,
    /// Expiration time as Unix timestamp
    pub exp: i64,
    /// Issued at time as Unix timestamp
    pub iat: i64,
}

/// Claims of session access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user id
    pub sub: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    /// Id of the session the token was minted for
    pub session: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn for_user(user: &User, session_id: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            user_type: user.user_type,
            session: Some(session_id.to_string()),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Outcome of verifying a token.
///
/// Expiry is kept apart from other failures because an expired access token
/// may still be swapped for a new one with a refresh token.
#[derive(Debug, Clone)]
pub enum TokenStatus<C> {
    Valid(C),
    Expired,
    Invalid,
}

impl<C> TokenStatus<C> {
    pub fn valid(self) -> Option<C> {
        match self {
            TokenStatus::Valid(claims) => Some(claims),
            TokenStatus::Expired | TokenStatus::Invalid => None,
        }
    }
}

/// RS256 key pair used to sign and verify every token the service issues.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &Algorithm::RS256)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    /// Builds the key pair from PEM-encoded RSA keys
    ///
    /// # Arguments
    /// * `private_pem` - RSA private key (PKCS#1 or PKCS#8)
    /// * `public_pem` - Matching RSA public key
    /// * `config` - TTL settings used when minting tokens
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8], config: JwtConfig) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| Error::Internal(format!("Invalid JWT private key: {}", e)))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| Error::Internal(format!("Invalid JWT public key: {}", e)))?;

        Ok(Self {
            encoding,
            decoding,
            validation: Validation::new(Algorithm::RS256),
            config,
        })
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self> {
        Self::from_pem(
            config.private_key_pem().as_bytes(),
            config.public_key_pem().as_bytes(),
            config.clone(),
        )
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::minutes(self.config.access_token_ttl_minutes)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.config.refresh_token_ttl_days)
    }

    pub fn login_token_ttl(&self) -> Duration {
        Duration::days(self.config.login_token_ttl_days)
    }

    /// Signs any claims set with the private key.
    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String> {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Failed to sign JWT: {}", e)))
    }

    /// Verifies signature and expiry. Never fails; the status says why a token
    /// was not accepted.
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> TokenStatus<C> {
        match decode::<C>(token, &self.decoding, &self.validation) {
            Ok(data) => TokenStatus::Valid(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => TokenStatus::Expired,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected JWT");
                TokenStatus::Invalid
            }
        }
    }

    /// Signs a login token for `user_id` and returns it with its expiry.
    pub fn sign_login_token(&self, user_id: &str) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expire_at = now + self.login_token_ttl();
        let claims = LoginClaims {
            sub: user_id.to_string(),
            exp: expire_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = self.sign(&claims)?;

        // Round to whole seconds so the value matches the token's `exp`.
        let expire_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expire_at);
        Ok((token, expire_at))
    }
}

/// Strips an optional `Bearer ` prefix from an Authorization header value.
///
/// Returns `None` for a missing or empty token.
pub fn strip_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() { None } else { Some(token) }
}
