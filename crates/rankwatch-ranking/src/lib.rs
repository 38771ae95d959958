//! DataForSEO SERP API client.
//!
//! Looks up where a target URL ranks in Google organic results for a given
//! search phrase, in live mode. One request, one answer; callers decide
//! what a failure means to them.
//!
//! # Example
//!
//! ```rust,ignore
//! use rankwatch_ranking::{DataForSeoClient, RankingProvider};
//!
//! let client = DataForSeoClient::from_env();
//!
//! match client.lookup_rank("ny taxi", "https://example.com").await? {
//!     Some(rank) => println!("ranked #{}", rank),
//!     None => println!("not in the results"),
//! }
//! ```

pub mod error;
pub mod types;

pub use error::RankingError;
pub use types::{RankingRequest, RankingResponse};

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

const BASE_URL: &str = "https://api.dataforseo.com/v3";

/// Google organic SERP, live mode, regular priority.
const LIVE_REGULAR_ENDPOINT: &str = "/serp/google/organic/live/regular";

/// DataForSEO location code for San Francisco, California.
const DEFAULT_LOCATION_CODE: u32 = 9004056;
const DEFAULT_LANGUAGE_CODE: &str = "en";

/// A slow provider must not stall callers indefinitely; past this budget
/// the lookup fails like any other network error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Where a URL ranks for a search phrase, as reported by an external
/// search-ranking service. `Ok(None)` means the lookup completed but the
/// target was not present in the results.
#[async_trait]
pub trait RankingProvider: Send + Sync {
    async fn lookup_rank(
        &self,
        search_phrase: &str,
        target_url: &str,
    ) -> Result<Option<i64>, RankingError>;
}

pub struct DataForSeoClient {
    client: reqwest::Client,
    credentials: Option<(String, String)>,
    location_code: u32,
    language_code: String,
}

impl DataForSeoClient {
    pub fn new(login: String, password: String) -> Self {
        Self::with_credentials(Some((login, password)))
    }

    /// Build from DATAFORSEO_LOGIN / DATAFORSEO_PASSWORD. A client built
    /// without credentials still constructs; every lookup then fails with
    /// [`RankingError::MissingCredentials`].
    pub fn from_env() -> Self {
        let credentials = match (
            std::env::var("DATAFORSEO_LOGIN"),
            std::env::var("DATAFORSEO_PASSWORD"),
        ) {
            (Ok(login), Ok(password)) => Some((login, password)),
            _ => None,
        };
        Self::with_credentials(credentials)
    }

    fn with_credentials(credentials: Option<(String, String)>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            location_code: DEFAULT_LOCATION_CODE,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl RankingProvider for DataForSeoClient {
    async fn lookup_rank(
        &self,
        search_phrase: &str,
        target_url: &str,
    ) -> Result<Option<i64>, RankingError> {
        let (login, password) = self
            .credentials
            .as_ref()
            .ok_or(RankingError::MissingCredentials)?;

        let task = RankingRequest {
            keyword: search_phrase.to_string(),
            location_code: self.location_code,
            language_code: self.language_code.clone(),
            target: target_url.to_string(),
        };

        let url = format!("{}{}", BASE_URL, LIVE_REGULAR_ENDPOINT);
        let resp = self
            .client
            .post(&url)
            .basic_auth(login, Some(password))
            .timeout(REQUEST_TIMEOUT)
            .json(&[task])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RankingError::Status { status, body });
        }

        let parsed: RankingResponse = resp.json().await.map_err(RankingError::Decode)?;
        debug!(rank = ?parsed.first_rank(), "ranking provider response");

        Ok(parsed.first_rank())
    }
}
