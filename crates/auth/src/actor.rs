use serde::{Deserialize, Serialize};

use jobgate_core::IdentityId;

use crate::AccountKind;

/// Authenticated caller of a protected operation.
///
/// Always built from the stored identity record after the token's subject has
/// been confirmed to exist, never from claims alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: IdentityId,
    pub email: String,
    pub kind: AccountKind,
}

impl Actor {
    pub fn new(id: IdentityId, email: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id,
            email: email.into(),
            kind,
        }
    }
}
