//! Token codec: the trust root of the whole system.
//!
//! Tokens are HS256 JWTs. Signature and shape are checked by `jsonwebtoken`;
//! the time window is checked by [`validate_claims`] against an explicit `now`
//! so expiry behaves identically in production and in tests.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use jobgate_core::IdentityId;

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};
use crate::AccountKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature mismatch")]
    BadSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Issue and verify signed identity tokens.
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `sub` that expires 24 hours after `now`.
    fn issue(
        &self,
        sub: IdentityId,
        email: &str,
        kind: AccountKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError>;

    /// Check signature, payload shape and time window.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Symmetric HS256 codec keyed by the process-wide signing secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        // Expiry is enforced by `validate_claims` with an injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(
        &self,
        sub: IdentityId,
        email: &str,
        kind: AccountKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = JwtClaims::issue(sub, email, kind, now);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let claims = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(b"test-secret")
    }

    #[test]
    fn issue_then_verify_returns_claims() {
        let codec = codec();
        let sub = IdentityId::new();
        let token = codec.issue(sub, "inst@example.com", AccountKind::Institution, t0()).unwrap();

        let claims = codec.verify(&token, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.email, "inst@example.com");
        assert_eq!(claims.kind, AccountKind::Institution);
        assert_eq!(claims.issued_at, t0());
        assert_eq!(claims.expires_at, t0() + Duration::hours(24));
    }

    #[test]
    fn verifies_at_23_59_59_and_fails_at_24_00_01() {
        let codec = codec();
        let token = codec.issue(IdentityId::new(), "a@example.com", AccountKind::Agency, t0()).unwrap();

        let almost = t0() + Duration::hours(24) - Duration::seconds(1);
        assert!(codec.verify(&token, almost).is_ok());

        let past = t0() + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(
            codec.verify(&token, past),
            Err(TokenError::Window(TokenValidationError::Expired))
        );
    }

    #[test]
    fn other_secret_is_a_signature_mismatch() {
        let token = codec()
            .issue(IdentityId::new(), "a@example.com", AccountKind::Agency, t0())
            .unwrap();
        let other = Hs256TokenCodec::new(b"another-secret");
        assert_eq!(other.verify(&token, t0()), Err(TokenError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec();
        let token = codec.issue(IdentityId::new(), "c@example.com", AccountKind::Contractor, t0()).unwrap();

        // Swap the payload for one claiming a different kind, keep the signature.
        let forged_claims = JwtClaims::issue(IdentityId::new(), "c@example.com", AccountKind::Agency, t0());
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = forged.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        let spliced = parts.join(".");

        assert_eq!(codec.verify(&spliced, t0()), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(codec().verify("not.a.jwt", t0()), Err(TokenError::Malformed(_))));
        assert!(matches!(codec().verify("", t0()), Err(TokenError::Malformed(_))));
    }
}
