use std::env;

/// Default fan-out bound for batch trust scoring.
const DEFAULT_SCORE_CONCURRENCY: usize = 8;

/// Engine tuning loaded from environment variables. Scoring weights are not
/// configuration; they are fixed design constants owned by the scorer and
/// the matcher.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many candidate providers are trust-scored concurrently.
    pub score_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            score_concurrency: env::var("TRUSTMESH_SCORE_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_SCORE_CONCURRENCY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            score_concurrency: DEFAULT_SCORE_CONCURRENCY,
        }
    }
}
