use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{DateTime, SecondsFormat, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::warn;
use url::Url;
use uuid::Uuid;

use rankwatch_db::Database;
use rankwatch_db::models::{TrackedUrlRow, UserRow};
use rankwatch_ranking::RankingProvider;
use rankwatch_types::api::{
    Claims, CreateTrackedUrlRequest, CreateTrackedUrlResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse,
};
use rankwatch_types::models::{TrackedUrl, User};

use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 8;

// -- Auth --

#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db: Arc<Database>, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ApiError> {
        validate_registration(&req)?;

        // The pre-check gives the friendly error; the UNIQUE constraint on
        // users.email is what holds when two signups race past this check.
        let db = self.db.clone();
        let email = req.email.clone();
        let existing = tokio::task::spawn_blocking(move || db.get_user_by_email(&email))
            .await
            .map_err(join_error)??;
        if existing.is_some() {
            return Err(ApiError::EmailInUse);
        }

        // Argon2id with a per-user random salt; the cleartext is dropped here.
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
            .to_string();

        let user_id = Uuid::new_v4();
        let row = UserRow {
            id: user_id.to_string(),
            email: req.email.clone(),
            password: password_hash,
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            company: req.company.clone(),
            created_at: format_timestamp(Utc::now()),
        };

        let db = self.db.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || db.create_user(&row))
            .await
            .map_err(join_error)?
        {
            // Lost the race: another signup claimed this email between the
            // check above and our write.
            if rankwatch_db::is_unique_violation(&err) {
                return Err(ApiError::EmailInUse);
            }
            return Err(ApiError::Internal(err));
        }

        Ok(RegisterResponse {
            id: user_id,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            company: req.company,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(ApiError::InvalidCredentials);
        }

        let db = self.db.clone();
        let email = req.email.clone();
        let user = tokio::task::spawn_blocking(move || db.get_user_by_email(&email))
            .await
            .map_err(join_error)??
            // Unknown email and wrong password answer identically.
            .ok_or(ApiError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
            ApiError::Internal(anyhow::anyhow!("stored password hash is corrupt: {}", e))
        })?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::InvalidCredentials)?;

        let user = user_from_row(user);
        let token = create_token(&self.jwt_secret, user.id, &user.email)?;

        Ok(LoginResponse { token, user })
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let required = [
        ("email", &req.email),
        ("password", &req.password),
        ("firstName", &req.first_name),
        ("lastName", &req.last_name),
        ("company", &req.company),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("{} is required", field)));
        }
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn create_token(secret: &str, user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token creation failed: {}", e)))
}

// -- Tracked URLs --

#[derive(Clone)]
pub struct TrackedUrlService {
    db: Arc<Database>,
    ranking: Arc<dyn RankingProvider>,
}

impl TrackedUrlService {
    pub fn new(db: Arc<Database>, ranking: Arc<dyn RankingProvider>) -> Self {
        Self { db, ranking }
    }

    /// Register a URL for tracking. The ranking lookup is best-effort:
    /// every provider failure is logged, mapped to "no rank", and never
    /// aborts the write.
    pub async fn create(
        &self,
        claims: &Claims,
        req: CreateTrackedUrlRequest,
    ) -> Result<CreateTrackedUrlResponse, ApiError> {
        validate_tracked_url(&req)?;
        self.resolve_user(claims).await?;

        let rank_position = match self.ranking.lookup_rank(&req.search_phrase, &req.url).await {
            Ok(rank) => rank,
            Err(err) => {
                warn!("ranking lookup failed for {}: {}", req.url, err);
                None
            }
        };

        let tracked_url = TrackedUrl {
            id: Uuid::new_v4(),
            search_phrase: req.search_phrase,
            location: req.location,
            url: req.url,
            user_id: claims.sub,
            created_at: Utc::now(),
        };

        let row = row_from_tracked_url(&tracked_url);
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.insert_tracked_url(&row))
            .await
            .map_err(join_error)??;

        Ok(CreateTrackedUrlResponse {
            tracked_url,
            rank_position,
        })
    }

    /// All of the requester's tracked URLs, most recent first. An empty
    /// list is a valid result, not an error.
    pub async fn list(&self, claims: &Claims) -> Result<Vec<TrackedUrl>, ApiError> {
        let owner = self.resolve_user(claims).await?;

        let db = self.db.clone();
        let rows = tokio::task::spawn_blocking(move || db.list_tracked_urls(&owner.id))
            .await
            .map_err(join_error)??;

        Ok(rows.into_iter().map(tracked_url_from_row).collect())
    }

    pub async fn delete(&self, claims: &Claims, tracked_url_id: Uuid) -> Result<(), ApiError> {
        let owner = self.resolve_user(claims).await?;

        let db = self.db.clone();
        let id = tracked_url_id.to_string();
        let deleted = tokio::task::spawn_blocking(move || db.delete_tracked_url(&id, &owner.id))
            .await
            .map_err(join_error)??;

        if deleted {
            Ok(())
        } else {
            Err(ApiError::NotFoundOrUnauthorized)
        }
    }

    /// Map the authenticated identity onto a stored user. A valid token
    /// whose account has since been deleted yields `UserNotFound`.
    async fn resolve_user(&self, claims: &Claims) -> Result<UserRow, ApiError> {
        let db = self.db.clone();
        let id = claims.sub.to_string();
        tokio::task::spawn_blocking(move || db.get_user_by_id(&id))
            .await
            .map_err(join_error)??
            .ok_or(ApiError::UserNotFound)
    }
}

fn validate_tracked_url(req: &CreateTrackedUrlRequest) -> Result<(), ApiError> {
    if req.search_phrase.trim().is_empty() {
        return Err(ApiError::InvalidInput("searchPhrase is required".into()));
    }
    if req.location.trim().is_empty() {
        return Err(ApiError::InvalidInput("location is required".into()));
    }
    if req.url.trim().is_empty() {
        return Err(ApiError::InvalidInput("url is required".into()));
    }
    if Url::parse(&req.url).is_err() {
        return Err(ApiError::InvalidInput(
            "url must be a valid absolute URL".into(),
        ));
    }
    Ok(())
}

// -- Row conversions --

/// RFC 3339 UTC with fixed-width fractional seconds, so the TEXT column
/// sorts chronologically.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_from_tracked_url(t: &TrackedUrl) -> TrackedUrlRow {
    TrackedUrlRow {
        id: t.id.to_string(),
        search_phrase: t.search_phrase.clone(),
        location: t.location.clone(),
        url: t.url.clone(),
        user_id: t.user_id.to_string(),
        created_at: format_timestamp(t.created_at),
    }
}

fn tracked_url_from_row(row: TrackedUrlRow) -> TrackedUrl {
    let id = row.id.parse().unwrap_or_else(|e| {
        warn!("Corrupt tracked url id '{}': {}", row.id, e);
        Uuid::default()
    });
    let user_id = row.user_id.parse().unwrap_or_else(|e| {
        warn!("Corrupt user_id on tracked url '{}': {}", row.id, e);
        Uuid::default()
    });
    let created_at = row
        .created_at
        .parse::<DateTime<Utc>>()
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on tracked url '{}': {}", row.created_at, row.id, e);
            DateTime::default()
        });

    TrackedUrl {
        id,
        user_id,
        created_at,
        search_phrase: row.search_phrase,
        location: row.location,
        url: row.url,
    }
}

fn user_from_row(row: UserRow) -> User {
    let id = row.id.parse().unwrap_or_else(|e| {
        warn!("Corrupt user id '{}': {}", row.id, e);
        Uuid::default()
    });
    let created_at = row
        .created_at
        .parse::<DateTime<Utc>>()
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on user '{}': {}", row.created_at, row.id, e);
            DateTime::default()
        });

    User {
        id,
        created_at,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        company: row.company,
    }
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rankwatch_ranking::RankingError;

    enum StubOutcome {
        Rank(i64),
        NotRanked,
        Unavailable,
    }

    struct StubRanking {
        outcome: StubOutcome,
        calls: AtomicUsize,
    }

    impl StubRanking {
        fn new(outcome: StubOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RankingProvider for StubRanking {
        async fn lookup_rank(
            &self,
            _search_phrase: &str,
            _target_url: &str,
        ) -> Result<Option<i64>, RankingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                StubOutcome::Rank(rank) => Ok(Some(rank)),
                StubOutcome::NotRanked => Ok(None),
                StubOutcome::Unavailable => Err(RankingError::MissingCredentials),
            }
        }
    }

    fn services(outcome: StubOutcome) -> (AuthService, TrackedUrlService, Arc<StubRanking>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let ranking = StubRanking::new(outcome);
        let auth = AuthService::new(db.clone(), "test-secret".into());
        let tracker = TrackedUrlService::new(db, ranking.clone());
        (auth, tracker, ranking)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "longenough1".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            company: "C".to_string(),
        }
    }

    fn create_request(url: &str) -> CreateTrackedUrlRequest {
        CreateTrackedUrlRequest {
            search_phrase: "NY Taxi".to_string(),
            location: "San Francisco, CA".to_string(),
            url: url.to_string(),
        }
    }

    async fn signed_up(auth: &AuthService, email: &str) -> Claims {
        let profile = auth.register(register_request(email)).await.unwrap();
        Claims {
            sub: profile.id,
            email: profile.email,
            exp: (Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        }
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let (auth, _, _) = services(StubOutcome::NotRanked);

        let profile = auth.register(register_request("a@x.com")).await.unwrap();
        assert_eq!(profile.email, "a@x.com");
        assert_eq!(profile.first_name, "A");

        let session = auth
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "longenough1".to_string(),
            })
            .await
            .unwrap();
        assert!(!session.token.is_empty());
        assert_eq!(session.user.id, profile.id);
        assert_eq!(session.user.company, "C");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_email() {
        let (auth, _, _) = services(StubOutcome::NotRanked);
        auth.register(register_request("a@x.com")).await.unwrap();

        let wrong = auth
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(ApiError::InvalidCredentials)));

        let unknown = auth
            .login(LoginRequest {
                email: "nobody@x.com".to_string(),
                password: "longenough1".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (auth, _, _) = services(StubOutcome::NotRanked);
        auth.register(register_request("a@x.com")).await.unwrap();

        let second = auth.register(register_request("a@x.com")).await;
        assert!(matches!(second, Err(ApiError::EmailInUse)));
    }

    #[tokio::test]
    async fn register_requires_every_field() {
        let (auth, _, _) = services(StubOutcome::NotRanked);

        let mut req = register_request("a@x.com");
        req.company = "".to_string();
        assert!(matches!(
            auth.register(req).await,
            Err(ApiError::InvalidInput(_))
        ));

        let mut req = register_request("a@x.com");
        req.password = "short".to_string();
        assert!(matches!(
            auth.register(req).await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn create_merges_rank_from_provider() {
        let (auth, tracker, ranking) = services(StubOutcome::Rank(7));
        let claims = signed_up(&auth, "a@x.com").await;

        let created = tracker
            .create(&claims, create_request("https://bad.example.com"))
            .await
            .unwrap();

        assert_eq!(created.rank_position, Some(7));
        assert_eq!(created.tracked_url.user_id, claims.sub);
        assert_eq!(created.tracked_url.search_phrase, "NY Taxi");
        assert_eq!(ranking.calls(), 1);

        // The rank is transient; the row itself is what got persisted.
        let listed = tracker.list(&claims).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.tracked_url.id);
    }

    #[tokio::test]
    async fn create_survives_provider_failure() {
        let (auth, tracker, ranking) = services(StubOutcome::Unavailable);
        let claims = signed_up(&auth, "a@x.com").await;

        let created = tracker
            .create(&claims, create_request("https://bad.example.com"))
            .await
            .unwrap();

        assert_eq!(created.rank_position, None);
        assert_eq!(ranking.calls(), 1);
        assert_eq!(tracker.list(&claims).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_without_rank_when_target_unranked() {
        let (auth, tracker, _) = services(StubOutcome::NotRanked);
        let claims = signed_up(&auth, "a@x.com").await;

        let created = tracker
            .create(&claims, create_request("https://bad.example.com"))
            .await
            .unwrap();
        assert_eq!(created.rank_position, None);
    }

    #[tokio::test]
    async fn create_validates_before_any_side_effect() {
        let (auth, tracker, ranking) = services(StubOutcome::Rank(7));
        let claims = signed_up(&auth, "a@x.com").await;

        let malformed = tracker.create(&claims, create_request("not-a-url")).await;
        assert!(matches!(malformed, Err(ApiError::InvalidInput(_))));

        let mut req = create_request("https://example.com");
        req.search_phrase = "  ".to_string();
        assert!(matches!(
            tracker.create(&claims, req).await,
            Err(ApiError::InvalidInput(_))
        ));

        let mut req = create_request("https://example.com");
        req.location = "".to_string();
        assert!(matches!(
            tracker.create(&claims, req).await,
            Err(ApiError::InvalidInput(_))
        ));

        // No provider call and no row for any of the rejected requests.
        assert_eq!(ranking.calls(), 0);
        assert!(tracker.list(&claims).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_orders_newest_first() {
        let (auth, tracker, _) = services(StubOutcome::NotRanked);
        let claims = signed_up(&auth, "a@x.com").await;

        let first = tracker
            .create(&claims, create_request("https://one.example.com"))
            .await
            .unwrap();
        let second = tracker
            .create(&claims, create_request("https://two.example.com"))
            .await
            .unwrap();
        let third = tracker
            .create(&claims, create_request("https://three.example.com"))
            .await
            .unwrap();

        let ids: Vec<Uuid> = tracker
            .list(&claims)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                third.tracked_url.id,
                second.tracked_url.id,
                first.tracked_url.id
            ]
        );
    }

    #[tokio::test]
    async fn delete_never_crosses_owners() {
        let (auth, tracker, _) = services(StubOutcome::NotRanked);
        let alice = signed_up(&auth, "alice@x.com").await;
        let bob = signed_up(&auth, "bob@x.com").await;

        let created = tracker
            .create(&alice, create_request("https://example.com"))
            .await
            .unwrap();
        let id = created.tracked_url.id;

        // Bob cannot delete Alice's row, or learn that it exists.
        let crossed = tracker.delete(&bob, id).await;
        assert!(matches!(crossed, Err(ApiError::NotFoundOrUnauthorized)));
        assert!(tracker.list(&bob).await.unwrap().is_empty());
        assert_eq!(tracker.list(&alice).await.unwrap().len(), 1);

        tracker.delete(&alice, id).await.unwrap();
        assert!(tracker.list(&alice).await.unwrap().is_empty());

        // A second delete of the same id is indistinguishable from a
        // delete of an id that never existed.
        let again = tracker.delete(&alice, id).await;
        assert!(matches!(again, Err(ApiError::NotFoundOrUnauthorized)));
    }

    #[tokio::test]
    async fn stale_identity_is_user_not_found() {
        let (_, tracker, ranking) = services(StubOutcome::Rank(7));
        let ghost = Claims {
            sub: Uuid::new_v4(),
            email: "ghost@x.com".to_string(),
            exp: (Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        };

        assert!(matches!(
            tracker
                .create(&ghost, create_request("https://example.com"))
                .await,
            Err(ApiError::UserNotFound)
        ));
        assert!(matches!(
            tracker.list(&ghost).await,
            Err(ApiError::UserNotFound)
        ));
        assert!(matches!(
            tracker.delete(&ghost, Uuid::new_v4()).await,
            Err(ApiError::UserNotFound)
        ));

        // A stale identity fails before the provider is ever consulted.
        assert_eq!(ranking.calls(), 0);
    }
}
