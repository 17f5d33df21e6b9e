//! Shared application state.

use std::sync::Arc;

use governor::RateLimiter;

use docmill_convert::ProcessingPipeline;
use docmill_core::BlobStore;
use docmill_db::Database;

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub store: Arc<dyn BlobStore>,
    pub pipeline: Arc<ProcessingPipeline>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}
