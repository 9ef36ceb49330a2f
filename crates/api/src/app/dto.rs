//! Request/response DTOs and JSON mapping helpers.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use jobgate_auth::{AccountKind, Actor, Profile};
use jobgate_infra::{Identity, JobDraft, JobListing, JobPosting, OwnerView};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: JobDraft,
}

#[derive(Debug, Deserialize)]
pub struct JobIdQuery {
    pub id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub id: String,
    pub email: String,
    pub user_type: AccountKind,
}

impl From<Actor> for ActorView {
    fn from(actor: Actor) -> Self {
        Self {
            id: actor.id.to_string(),
            email: actor.email,
            user_type: actor.kind,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingView<'a> {
    #[serde(flatten)]
    pub posting: &'a JobPosting,
    pub owner: &'a OwnerView,
}

impl<'a> From<&'a JobListing> for ListingView<'a> {
    fn from(listing: &'a JobListing) -> Self {
        Self {
            posting: &listing.posting,
            owner: &listing.owner,
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn registered_to_json(identity: &Identity, profile: &Profile) -> Value {
    let mut body = Map::new();
    body.insert("message".to_string(), json!("User registered successfully"));
    body.insert("userId".to_string(), json!(identity.id.to_string()));
    if let Profile::Contractor(_) = profile {
        body.insert(profile.kind().profile_key().to_string(), profile.to_json());
    }
    Value::Object(body)
}

pub fn login_to_json(token: &str, identity: &Identity, profile: &Profile) -> Value {
    let mut user = Map::new();
    user.insert("id".to_string(), json!(identity.id.to_string()));
    user.insert("email".to_string(), json!(identity.email));
    user.insert("username".to_string(), json!(identity.username));
    user.insert("userType".to_string(), json!(identity.kind));
    user.insert(identity.kind.profile_key().to_string(), profile.to_json());

    json!({
        "message": "Login successful",
        "token": token,
        "user": Value::Object(user),
    })
}
