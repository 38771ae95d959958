use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The stored password hash never leaves the DB
/// layer — this type deliberately has no password field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

/// A (search phrase, location, url) tuple a user has registered for
/// ranking observation. Owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedUrl {
    pub id: Uuid,
    pub search_phrase: String,
    pub location: String,
    pub url: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}
