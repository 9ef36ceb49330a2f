use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use jobgate_auth::{Actor, TokenCodec};
use jobgate_core::ServiceResult;

use crate::store::CredentialStore;

/// Turns a bearer token into a store-confirmed [`Actor`].
pub struct IdentityResolver {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(codec: Arc<dyn TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    /// `Ok(None)` for any token that fails verification or whose subject no
    /// longer exists. Store failures propagate as errors.
    ///
    /// The actor's email and kind come from the stored identity, not the claims.
    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<Option<Actor>> {
        let claims = match self.codec.verify(token, now) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "token rejected");
                return Ok(None);
            }
        };

        let Some(identity) = self.store.find_identity(claims.sub).await? else {
            debug!(sub = %claims.sub, "token subject no longer exists");
            return Ok(None);
        };

        Ok(Some(Actor::new(identity.id, identity.email, identity.kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jobgate_auth::{AccountKind, AgencyProfile, Hs256TokenCodec, Profile};
    use jobgate_core::IdentityId;

    use crate::store::{InMemoryStore, NewIdentity};

    async fn seeded() -> (IdentityResolver, Arc<InMemoryStore>, Arc<Hs256TokenCodec>, IdentityId) {
        let store = Arc::new(InMemoryStore::new());
        let codec = Arc::new(Hs256TokenCodec::new(b"resolver-test-secret"));
        let identity = store
            .create_identity(NewIdentity {
                id: IdentityId::new(),
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                profile: Profile::Agency(AgencyProfile {
                    agency_name: "Staffers".to_string(),
                    license_number: "L-1".to_string(),
                    specialization: "STEM".to_string(),
                    years_experience: 3,
                }),
            })
            .await
            .unwrap();
        let resolver = IdentityResolver::new(codec.clone(), store.clone());
        (resolver, store, codec, identity.id)
    }

    #[tokio::test]
    async fn resolves_to_the_stored_identity() {
        let (resolver, _, codec, id) = seeded().await;
        let now = Utc::now();
        let token = codec.issue(id, "ana@example.com", AccountKind::Agency, now).unwrap();

        let actor = resolver.resolve(&token, now).await.unwrap().unwrap();
        assert_eq!(actor, Actor::new(id, "ana@example.com", AccountKind::Agency));
    }

    #[tokio::test]
    async fn kind_and_email_come_from_the_store_not_the_claims() {
        let (resolver, _, codec, id) = seeded().await;
        let now = Utc::now();
        let token = codec.issue(id, "forged@example.com", AccountKind::Institution, now).unwrap();

        let actor = resolver.resolve(&token, now).await.unwrap().unwrap();
        assert_eq!(actor.kind, AccountKind::Agency);
        assert_eq!(actor.email, "ana@example.com");
    }

    #[tokio::test]
    async fn deleted_subject_does_not_resolve() {
        let (resolver, store, codec, id) = seeded().await;
        let now = Utc::now();
        let token = codec.issue(id, "ana@example.com", AccountKind::Agency, now).unwrap();

        assert!(store.delete_identity(id).await.unwrap());
        assert_eq!(resolver.resolve(&token, now).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_or_garbage_tokens_do_not_resolve() {
        let (resolver, _, codec, id) = seeded().await;
        let now = Utc::now();
        let token = codec.issue(id, "ana@example.com", AccountKind::Agency, now).unwrap();

        let later = now + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(resolver.resolve(&token, later).await.unwrap(), None);
        assert_eq!(resolver.resolve("not.a.jwt", now).await.unwrap(), None);
    }
}
