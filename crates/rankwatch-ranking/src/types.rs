use serde::{Deserialize, Serialize};

/// One task in a live SERP request. The API accepts an array of tasks;
/// we always submit exactly one.
#[derive(Debug, Clone, Serialize)]
pub struct RankingRequest {
    pub keyword: String,
    pub location_code: u32,
    pub language_code: String,
    pub target: String,
}

/// Response envelope. The provider returns far more fields than these;
/// everything we do not extract is ignored, and every level we do extract
/// is optional — a missing level means "target not ranked", never an error.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingResponse {
    #[serde(default)]
    pub tasks: Option<Vec<RankingTask>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingTask {
    #[serde(default)]
    pub result: Option<Vec<TaskResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub items: Option<Vec<ResultItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultItem {
    #[serde(default)]
    pub rank_absolute: Option<i64>,
}

impl RankingResponse {
    /// Absolute rank of the first item of the first result of the first
    /// task — the 1-based position of the target in organic results.
    pub fn first_rank(&self) -> Option<i64> {
        self.tasks
            .as_deref()?
            .first()?
            .result
            .as_deref()?
            .first()?
            .items
            .as_deref()?
            .first()?
            .rank_absolute
    }
}
