/// Database row types — these map directly to SQLite rows.
/// Distinct from rankwatch-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub created_at: String,
}

pub struct TrackedUrlRow {
    pub id: String,
    pub search_phrase: String,
    pub location: String,
    pub url: String,
    pub user_id: String,
    pub created_at: String,
}
