use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{TrackedUrl, User};

// -- JWT Claims --

/// JWT claims shared between the login handler (issuing) and the REST
/// middleware (validating). Canonical definition lives here in
/// rankwatch-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
}

/// Public profile returned at signup. No password, no hash, no token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// -- Tracked URLs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateTrackedUrlRequest {
    pub search_phrase: String,
    pub location: String,
    pub url: String,
}

/// The persisted row merged with the transient rank. `rank_position` is
/// enrichment metadata produced once, at creation time — it is not stored
/// and does not appear on list responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrackedUrlResponse {
    #[serde(flatten)]
    pub tracked_url: TrackedUrl,
    pub rank_position: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTrackedUrlResponse {
    pub success: bool,
}
