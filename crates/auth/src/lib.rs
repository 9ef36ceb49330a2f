//! `jobgate-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! sign and verify tokens, hash passwords, shape per-kind profiles and decide
//! whether an actor may proceed, but never where any of that is persisted.

pub mod actor;
pub mod authorize;
pub mod claims;
pub mod codec;
pub mod kind;
pub mod password;
pub mod profile;

pub use actor::Actor;
pub use authorize::{authorize, AuthzError, JOB_POSTER_KINDS};
pub use claims::{validate_claims, JwtClaims, TokenValidationError, TOKEN_LIFETIME};
pub use codec::{Hs256TokenCodec, TokenCodec, TokenError};
pub use kind::{AccountKind, UnknownKind};
pub use password::{Argon2Passwords, PasswordError, PasswordVerifier};
pub use profile::{
    AgencyProfile, ContractorProfile, InstitutionProfile, Profile, ProfileError,
    EXPERTISE_DELIMITER, MAX_COUNT,
};
