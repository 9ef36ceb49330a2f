use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use jobgate_auth::{PasswordVerifier, Profile, TokenCodec};
use jobgate_core::{ServiceError, ServiceResult};

use crate::blocking_password;
use crate::registrar::normalize_email;
use crate::store::{CredentialStore, Identity};

/// Well-formed argon2id hash matching no password. Verified against when the
/// email is unknown so both failure paths pay for one hash.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub identity: Identity,
    pub profile: Profile,
}

/// Password login: verify credentials, load the extension, issue a token.
pub struct LoginService {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordVerifier>,
    codec: Arc<dyn TokenCodec>,
}

impl LoginService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordVerifier>,
        codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            store,
            passwords,
            codec,
        }
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, password), err)]
    pub async fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> ServiceResult<LoginOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::validation("email and password are required"));
        }

        let identity = self.store.find_identity_by_email(&email).await?;

        let password = password.to_string();
        let hash = identity
            .as_ref()
            .map_or_else(|| DUMMY_HASH.to_string(), |i| i.password_hash.clone());
        let ok = blocking_password(&self.passwords, move |p| p.verify(&password, &hash)).await?;

        let Some(identity) = identity.filter(|_| ok) else {
            return Err(ServiceError::InvalidCredentials);
        };

        let Some(profile) = self.store.find_profile(identity.id, identity.kind).await? else {
            error!(identity_id = %identity.id, kind = %identity.kind, "identity has no profile extension");
            return Err(ServiceError::integrity(format!(
                "no {} profile for identity {}",
                identity.kind.profile_key(),
                identity.id
            )));
        };

        let token = self
            .codec
            .issue(identity.id, &identity.email, identity.kind, now)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        info!(identity_id = %identity.id, kind = %identity.kind, "login succeeded");
        Ok(LoginOutcome {
            token,
            identity,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jobgate_auth::{AccountKind, Argon2Passwords, Hs256TokenCodec, PasswordError};
    use serde_json::json;

    use crate::registrar::{ProfileRegistrar, Registration};
    use crate::resolver::IdentityResolver;
    use crate::store::InMemoryStore;

    struct Harness {
        store: Arc<InMemoryStore>,
        registrar: ProfileRegistrar,
        login: LoginService,
        resolver: IdentityResolver,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let passwords: Arc<dyn PasswordVerifier> = Arc::new(Argon2Passwords);
        let codec: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(b"login-test-secret"));
        Harness {
            registrar: ProfileRegistrar::new(store.clone(), passwords.clone()),
            login: LoginService::new(store.clone(), passwords, codec.clone()),
            resolver: IdentityResolver::new(codec, store.clone()),
            store,
        }
    }

    fn contractor() -> Registration {
        Registration {
            username: "carla".to_string(),
            email: "carla@example.com".to_string(),
            password: "correct horse".to_string(),
            user_type: Some("CONTRACTOR".to_string()),
            additional_info: Some(json!({
                "expertise": "Math,Science",
                "certification": "TEFL",
                "availableHours": 10,
                "hourlyRate": 25,
            })),
        }
    }

    #[tokio::test]
    async fn register_login_resolve_preserves_kind() {
        let h = harness();
        let now = Utc::now();
        let registered = h.registrar.register(contractor(), now).await.unwrap();

        let out = h.login.login("Carla@Example.com", "correct horse", now).await.unwrap();
        assert_eq!(out.identity.id, registered.identity.id);
        let Profile::Contractor(p) = &out.profile else {
            panic!("expected contractor profile");
        };
        assert_eq!(p.expertise, vec!["Math".to_string(), "Science".to_string()]);

        let actor = h.resolver.resolve(&out.token, now).await.unwrap().unwrap();
        assert_eq!(actor.kind, AccountKind::Contractor);
        assert_eq!(actor.id, registered.identity.id);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_identically() {
        let h = harness();
        let now = Utc::now();
        h.registrar.register(contractor(), now).await.unwrap();

        let unknown = h.login.login("nobody@example.com", "correct horse", now).await.unwrap_err();
        let wrong = h.login.login("carla@example.com", "wrong horse", now).await.unwrap_err();
        assert_eq!(unknown, ServiceError::InvalidCredentials);
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[derive(Default)]
    struct CountingPasswords {
        verifies: AtomicUsize,
    }

    impl PasswordVerifier for CountingPasswords {
        fn hash(&self, password: &str) -> Result<String, PasswordError> {
            Argon2Passwords.hash(password)
        }

        fn verify(&self, password: &str, hashword: &str) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            Argon2Passwords.verify(password, hashword)
        }
    }

    #[tokio::test]
    async fn unknown_email_still_runs_one_verification() {
        let store = Arc::new(InMemoryStore::new());
        let counting = Arc::new(CountingPasswords::default());
        let passwords: Arc<dyn PasswordVerifier> = counting.clone();
        let codec: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(b"login-test-secret"));
        let registrar = ProfileRegistrar::new(store.clone(), passwords.clone());
        let login = LoginService::new(store, passwords, codec);
        let now = Utc::now();
        registrar.register(contractor(), now).await.unwrap();

        assert_eq!(
            login.login("nobody@example.com", "correct horse", now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
        assert_eq!(counting.verifies.load(Ordering::SeqCst), 1);

        assert_eq!(
            login.login("carla@example.com", "wrong horse", now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
        assert_eq!(counting.verifies.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dummy_hash_never_verifies() {
        assert!(!Argon2Passwords.verify("", DUMMY_HASH));
        assert!(!Argon2Passwords.verify("correct horse", DUMMY_HASH));
    }

    #[tokio::test]
    async fn blank_input_is_a_validation_error() {
        let h = harness();
        assert!(matches!(
            h.login.login("  ", "x", Utc::now()).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            h.login.login("a@example.com", "", Utc::now()).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn deleted_identity_cannot_log_in() {
        let h = harness();
        let now = Utc::now();
        let registered = h.registrar.register(contractor(), now).await.unwrap();
        let token = h.login.login("carla@example.com", "correct horse", now).await.unwrap().token;

        h.store.delete_identity(registered.identity.id).await.unwrap();
        assert_eq!(h.resolver.resolve(&token, now).await.unwrap(), None);
        assert_eq!(
            h.login.login("carla@example.com", "correct horse", now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
    }
}
