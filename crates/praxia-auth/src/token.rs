//! JWT encode/decode

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use praxia_common::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 shared secret
    pub secret: String,
    /// Expected issuer
    pub issuer: String,
    /// Expected audience
    pub audience: String,
    /// Token lifetime in seconds
    pub expiry_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "praxia".to_string(),
            audience: "praxia-api".to_string(),
            expiry_secs: 3600,
        }
    }
}

/// Credential claims
///
/// `tenant_id` is absent for platform-admin credentials. The
/// authorization hints (`allowed_apps`, `user_type`) ride in the token
/// because they churn slowly; security-critical subject state does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub sub: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Tenant binding; `None` for platform admins
    pub tenant_id: Option<i64>,
    /// Optional platform role hint
    pub platform_role: Option<String>,
    /// Application allow-list hint
    pub allowed_apps: Vec<String>,
    /// User-type hint
    pub user_type: String,
}

/// HS256 token codec
pub struct TokenCodec {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec from configuration
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a signed token for a subject
    pub fn issue(
        &self,
        user_id: i64,
        tenant_id: Option<i64>,
        platform_role: Option<String>,
        allowed_apps: Vec<String>,
        user_type: &str,
    ) -> AccessResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expiry_secs as i64);

        let claims = Claims {
            sub: user_id,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            tenant_id,
            platform_role,
            allowed_apps,
            user_type: user_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AccessError::Internal(format!("token encode failed: {e}")))
    }

    /// Validate signature, expiry, issuer, and audience
    pub fn decode(&self, token: &str) -> AccessResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AccessError::TokenExpired,
                _ => AccessError::TokenInvalid,
            })
    }
}
