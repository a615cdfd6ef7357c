//! The vectorization worker loop.
//!
//! A single cooperative loop: fetch a batch of unprocessed articles, embed
//! each one, upsert the vector keyed by url, mark the article complete. The
//! only suspension points are the empty-batch sleep and the post-error
//! sleep, both one poll interval. There is no internal parallelism; every
//! external call blocks the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{DocumentStoreError, ProcessError, Retryable};
use crate::models::{DuplicateCandidate, NewsDocument, RecordMetadata, WorkerConfig};
use crate::services::{DateWindow, DocumentStore, DuplicateDetector, Embedder, VectorIndex};
use crate::utils::date;

/// What happened to one document of a batch.
///
/// Failures are isolated: nothing already written for the document is rolled
/// back, and its status flag stays unset, so it is re-offered on a later
/// cycle. At-least-once, not exactly-once.
#[derive(Debug)]
pub enum DocumentOutcome {
    Completed {
        id: i64,
        url: String,
        duplicates: Vec<DuplicateCandidate>,
    },
    Failed {
        id: i64,
        error: ProcessError,
    },
}

/// Aggregated per-document outcomes of one processed batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Completed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}

/// Result of one poll cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The batch query returned nothing; the loop sleeps one poll interval.
    Idle,
    Processed(BatchReport),
}

/// The end-to-end per-document pipeline and its driving loop.
///
/// Holds no state beyond the injected store handles and the embedding
/// client, all established once at startup.
pub struct VectorizationWorker {
    documents: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    detector: DuplicateDetector,
    config: WorkerConfig,
}

impl VectorizationWorker {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            documents,
            index,
            embedder,
            detector: DuplicateDetector::new(&config.duplicates),
            config,
        }
    }

    /// Run forever. An empty batch and a failed batch query both sleep one
    /// poll interval before the next cycle; the latter keeps a broken store
    /// from turning into a hot retry loop. Cancellation is the caller's
    /// concern (drop the future).
    pub async fn run(&self) {
        info!(
            batch_size = self.config.batch_size,
            poll_interval_secs = self.config.poll_interval_secs,
            status_field = %self.config.status_field,
            duplicates_enabled = self.config.duplicates.enabled,
            "entering vectorization loop"
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);

        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Idle) => {
                    debug!("no pending documents, waiting");
                    sleep(poll_interval).await;
                }
                Ok(CycleOutcome::Processed(report)) => {
                    info!(
                        completed = report.completed(),
                        failed = report.failed(),
                        "batch processed"
                    );
                }
                Err(e) => {
                    error!(error = %e, "batch query failed, waiting before retry");
                    sleep(poll_interval).await;
                }
            }
        }
    }

    /// One poll cycle: fetch up to `batch_size` unprocessed documents and
    /// process each in isolation. Only the batch query itself can fail here;
    /// per-document failures are captured in the report.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, DocumentStoreError> {
        let batch = self
            .documents
            .fetch_unprocessed(&self.config.status_field, self.config.batch_size)
            .await?;

        if batch.is_empty() {
            return Ok(CycleOutcome::Idle);
        }

        info!(count = batch.len(), "found documents to process");

        let mut report = BatchReport::default();
        for document in batch {
            let id = document.id;
            match self.process_document(document).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    error!(
                        document = id,
                        error = %e,
                        transient = e.is_retryable(),
                        "failed to process document"
                    );
                    report.outcomes.push(DocumentOutcome::Failed { id, error: e });
                }
            }
        }

        Ok(CycleOutcome::Processed(report))
    }

    /// The per-document pipeline: extract fields, normalize the publish
    /// date, embed, optionally scan for near-duplicates, upsert the vector,
    /// mark the document complete.
    async fn process_document(
        &self,
        document: NewsDocument,
    ) -> Result<DocumentOutcome, ProcessError> {
        let url = document.url.clone().ok_or(ProcessError::MissingUrl)?;
        let title = document.title_or_default();

        debug!(document = document.id, %url, %title, "processing article");

        let publish_day = document.publish_day();
        let publish_date = date::day_timestamp(&publish_day)?;

        let embedding = self.embedder.encode(&document.content).await?;

        // Advisory only: candidates are logged and reported, insertion is
        // never blocked. Runs before the upsert so a record cannot match
        // itself when a url is re-processed.
        let duplicates = if self.config.duplicates.enabled {
            let window = DateWindow::ending_today(self.config.duplicates.window_days);
            let candidates = self
                .detector
                .find_duplicates(self.index.as_ref(), &embedding, window)
                .await;
            if !candidates.is_empty() {
                warn!(
                    %url,
                    count = candidates.len(),
                    nearest = f64::from(candidates[0].distance),
                    "near-duplicate candidates found"
                );
            }
            candidates
        } else {
            Vec::new()
        };

        let metadata = RecordMetadata {
            title,
            url: url.clone(),
            publish_date,
        };
        self.index.add_document(&url, embedding, metadata).await?;

        self.documents
            .mark_complete(document.id, &self.config.status_field)
            .await?;

        info!(document = document.id, %url, "document processed");

        Ok(DocumentOutcome::Completed {
            id: document.id,
            url,
            duplicates,
        })
    }
}
