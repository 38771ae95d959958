use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong talking to the ranking provider. Callers
/// that enrich records treat every variant the same way — no rank — so
/// none of these is fatal to them; the variants exist so the fallback is
/// an explicit branch and the log line says what actually happened.
#[derive(Debug, Error)]
pub enum RankingError {
    /// DATAFORSEO_LOGIN / DATAFORSEO_PASSWORD were not configured.
    #[error("ranking provider credentials not configured")]
    MissingCredentials,

    /// Network-level failure: DNS, connect, timeout.
    #[error("ranking provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("ranking provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The provider answered 2xx but the body was not the expected JSON.
    #[error("ranking provider response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}
