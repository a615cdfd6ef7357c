//! Near-duplicate detection over the vector index.

use chrono::{Duration, NaiveDate, Utc};
use tracing::warn;

use crate::models::{DuplicateCandidate, DuplicateConfig};
use crate::services::vector_store::VectorIndex;
use crate::utils::date;

/// Closed day-granularity date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The window covering the last `days` days, ending today (UTC).
    pub fn ending_today(days: u32) -> Self {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(i64::from(days));
        Self { start, end }
    }

    /// Both endpoints as epoch seconds at day granularity, inclusive.
    pub fn to_epoch_range(&self) -> (i64, i64) {
        (
            date::date_timestamp(self.start),
            date::date_timestamp(self.end),
        )
    }
}

/// Finds stored records whose embeddings sit within a distance threshold of
/// a candidate embedding, restricted to a publish-date window.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    threshold: f32,
    top_k: u64,
}

impl DuplicateDetector {
    pub fn new(config: &DuplicateConfig) -> Self {
        Self {
            threshold: config.distance_threshold,
            top_k: config.top_k,
        }
    }

    /// Near-duplicates of `embedding` inside `window`: the store's top
    /// neighbors filtered to `distance <= threshold` (inclusive), in the
    /// store's ranking order.
    ///
    /// A store failure is fail-open: logged and reported as no duplicates,
    /// so detection never blocks the pipeline.
    pub async fn find_duplicates(
        &self,
        index: &dyn VectorIndex,
        embedding: &[f32],
        window: DateWindow,
    ) -> Vec<DuplicateCandidate> {
        let range = window.to_epoch_range();

        match index.search_similar(embedding, self.top_k, Some(range)).await {
            Ok(neighbors) => neighbors
                .into_iter()
                .filter(|n| n.distance <= self.threshold)
                .map(|n| DuplicateCandidate {
                    metadata: n.metadata,
                    distance: n.distance,
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "duplicate search failed, treating as no duplicates");
                Vec::new()
            }
        }
    }
}
