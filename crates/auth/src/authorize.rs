use thiserror::Error;

use crate::{AccountKind, Actor};

/// Kinds allowed to create and manage job postings.
pub const JOB_POSTER_KINDS: &[AccountKind] = &[AccountKind::Institution, AccountKind::Agency];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0} accounts may not perform this operation")]
    KindNotAllowed(AccountKind),
}

/// Authorize an actor against a kind allow-list.
///
/// An empty allow-list admits every authenticated actor.
///
/// - No IO
/// - No panics
pub fn authorize(actor: &Actor, allowed: &[AccountKind]) -> Result<(), AuthzError> {
    if allowed.is_empty() || allowed.contains(&actor.kind) {
        Ok(())
    } else {
        Err(AuthzError::KindNotAllowed(actor.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobgate_core::IdentityId;

    fn actor(kind: AccountKind) -> Actor {
        Actor::new(IdentityId::new(), "someone@example.com", kind)
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        for kind in AccountKind::ALL {
            assert_eq!(authorize(&actor(kind), &[]), Ok(()));
        }
    }

    #[test]
    fn job_posters_are_institutions_and_agencies() {
        assert!(authorize(&actor(AccountKind::Institution), JOB_POSTER_KINDS).is_ok());
        assert!(authorize(&actor(AccountKind::Agency), JOB_POSTER_KINDS).is_ok());
        assert_eq!(
            authorize(&actor(AccountKind::Contractor), JOB_POSTER_KINDS),
            Err(AuthzError::KindNotAllowed(AccountKind::Contractor))
        );
    }
}
