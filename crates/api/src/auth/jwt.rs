//! Verification of member access tokens.
//!
//! Tokens are minted by the account service and signed with a shared HS256
//! secret. This server never issues them; it only resolves the member a
//! token was issued to. The subject is the member's database id.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use projectree_core::types::DbId;
use serde::Deserialize;

/// The claims this server reads from a member token.
///
/// Other claims the account service adds are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberClaims {
    /// The member's database id.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the account service.
    pub secret: String,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_secs: u64,
}

const DEFAULT_LEEWAY_SECS: u64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var            | Required | Default |
    /// |--------------------|----------|---------|
    /// | `JWT_SECRET`       | **yes**  | --      |
    /// | `JWT_LEEWAY_SECS`  | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let leeway_secs: u64 = std::env::var("JWT_LEEWAY_SECS")
            .unwrap_or_else(|_| DEFAULT_LEEWAY_SECS.to_string())
            .parse()
            .expect("JWT_LEEWAY_SECS must be a valid u64");

        Self {
            secret,
            leeway_secs,
        }
    }
}

/// Check the signature and expiry of `token` and return its member claims.
pub fn verify_member_token(
    token: &str,
    config: &JwtConfig,
) -> Result<MemberClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway_secs;

    let data = decode::<MemberClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
