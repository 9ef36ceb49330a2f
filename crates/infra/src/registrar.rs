//! Registration: identity + kind extension, created as one unit.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use jobgate_auth::{AccountKind, PasswordVerifier, Profile};
use jobgate_core::{IdentityId, ServiceError, ServiceResult};

use crate::blocking_password;
use crate::store::{CredentialStore, Identity, NewIdentity};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration request as received on the wire.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub user_type: Option<String>,
    pub additional_info: Option<serde_json::Value>,
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("user_type", &self.user_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Registered {
    pub identity: Identity,
    pub profile: Profile,
}

/// Creates identities and their kind-matched extension.
pub struct ProfileRegistrar {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordVerifier>,
}

impl ProfileRegistrar {
    pub fn new(store: Arc<dyn CredentialStore>, passwords: Arc<dyn PasswordVerifier>) -> Self {
        Self { store, passwords }
    }

    /// Validate, hash and persist a registration.
    ///
    /// Checks run cheapest first: presence, kind, password length, email shape,
    /// extension fields, then uniqueness. The store remains the final arbiter
    /// of uniqueness when two registrations race.
    #[instrument(skip(self, reg), fields(username = %reg.username), err)]
    pub async fn register(&self, reg: Registration, now: DateTime<Utc>) -> ServiceResult<Registered> {
        let username = reg.username.trim().to_string();
        let email = normalize_email(&reg.email);
        if username.is_empty() || email.is_empty() || reg.password.is_empty() {
            return Err(ServiceError::validation("username, email and password are required"));
        }

        let kind: AccountKind = match reg.user_type.as_deref().map(str::trim) {
            None | Some("") => return Err(ServiceError::validation("userType is required")),
            Some(raw) => raw
                .parse()
                .map_err(|_| ServiceError::validation(format!("invalid userType '{raw}'")))?,
        };

        if reg.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if !plausible_email(&email) {
            return Err(ServiceError::validation("email is not a valid address"));
        }

        let profile = Profile::from_fields(kind, reg.additional_info.as_ref())
            .map_err(|e| ServiceError::validation(e.to_string()))?;
        profile
            .validate(now.year())
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        if let Some(key) = self.store.identity_taken(&username, &email).await? {
            return Err(ServiceError::conflict(format!("{key} already exists")));
        }

        let password = reg.password;
        let password_hash = blocking_password(&self.passwords, move |p| p.hash(&password))
            .await?
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        let identity = self
            .store
            .create_identity(NewIdentity {
                id: IdentityId::new(),
                username,
                email,
                password_hash,
                profile: profile.clone(),
            })
            .await?;

        info!(identity_id = %identity.id, kind = %identity.kind, "identity registered");
        Ok(Registered { identity, profile })
    }
}

/// Trim and lowercase; the stored and looked-up form of every email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
