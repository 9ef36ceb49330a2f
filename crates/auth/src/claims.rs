use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jobgate_core::IdentityId;

use crate::AccountKind;

/// Fixed token lifetime, measured from issuance.
pub const TOKEN_LIFETIME: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

fn lifetime() -> Duration {
    Duration::seconds(TOKEN_LIFETIME.as_secs() as i64)
}

/// JWT claims model (transport-agnostic).
///
/// Timestamps travel as standard `iat`/`exp` seconds-since-epoch claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / identity identifier.
    pub sub: IdentityId,

    pub email: String,

    pub kind: AccountKind,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    /// Claims for a token issued at `now`, expiring [`TOKEN_LIFETIME`] later.
    ///
    /// `now` is truncated to whole seconds so the claims survive encoding unchanged.
    pub fn issue(sub: IdentityId, email: impl Into<String>, kind: AccountKind, now: DateTime<Utc>) -> Self {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self {
            sub,
            email: email.into(),
            kind,
            issued_at,
            expires_at: issued_at + lifetime(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::codec`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
