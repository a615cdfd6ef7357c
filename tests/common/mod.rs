//! In-memory fakes of the worker's three external collaborators.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use newsvec::error::{DocumentStoreError, EmbeddingError, VectorStoreError};
use newsvec::models::{NewsDocument, PublishDate, RecordMetadata, ScoredRecord, TaskStatus};
use newsvec::services::{DocumentStore, Embedder, VectorIndex};

/// Text marker that makes [`FakeEmbedder`] fail for a document.
pub const EMBED_FAIL: &str = "EMBED_FAIL";

pub fn article(id: i64, url: Option<&str>, published_at: Option<PublishDate>) -> NewsDocument {
    NewsDocument {
        id,
        content: format!("article body {id}"),
        title: Some(format!("Title {id}")),
        url: url.map(str::to_string),
        published_at,
    }
}

/// Document store holding articles and their per-task status flags.
#[derive(Default)]
pub struct FakeDocumentStore {
    documents: Mutex<Vec<NewsDocument>>,
    statuses: Mutex<HashMap<(i64, String), TaskStatus>>,
    pub fetches: AtomicU32,
    fail_next_fetch: AtomicBool,
}

impl FakeDocumentStore {
    pub fn with_documents(documents: Vec<NewsDocument>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Default::default()
        }
    }

    pub fn status(&self, id: i64, status_field: &str) -> TaskStatus {
        self.statuses
            .lock()
            .unwrap()
            .get(&(id, status_field.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Make the next batch query fail, as a transient store error would.
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn health_check(&self) -> Result<(), DocumentStoreError> {
        Ok(())
    }

    async fn fetch_unprocessed(
        &self,
        status_field: &str,
        limit: i64,
    ) -> Result<Vec<NewsDocument>, DocumentStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(DocumentStoreError::QueryError("connection reset".into()));
        }

        let statuses = self.statuses.lock().unwrap();
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .filter(|d| {
                !statuses
                    .get(&(d.id, status_field.to_string()))
                    .copied()
                    .unwrap_or_default()
                    .is_complete()
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_complete(
        &self,
        id: i64,
        status_field: &str,
    ) -> Result<bool, DocumentStoreError> {
        self.statuses
            .lock()
            .unwrap()
            .insert((id, status_field.to_string()), TaskStatus::Complete);
        Ok(true)
    }
}

/// Vector index keyed by url, ranking searches by `1 - dot(query, stored)`.
/// Embeddings are assumed unit length, so chosen dot products map to exact
/// distances.
#[derive(Default)]
pub struct FakeVectorIndex {
    records: Mutex<HashMap<String, (Vec<f32>, RecordMetadata)>>,
    pub upserts: AtomicU32,
    fail_search: AtomicBool,
    fail_upsert: AtomicBool,
}

impl FakeVectorIndex {
    pub fn seed(&self, url: &str, embedding: Vec<f32>, metadata: RecordMetadata) {
        self.records
            .lock()
            .unwrap()
            .insert(url.to_string(), (embedding, metadata));
    }

    pub fn record(&self, url: &str) -> Option<RecordMetadata> {
        self.records
            .lock()
            .unwrap()
            .get(url)
            .map(|(_, m)| m.clone())
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn fail_searches(&self) {
        self.fail_search.store(true, Ordering::SeqCst);
    }

    pub fn fail_upserts(&self) {
        self.fail_upsert.store(true, Ordering::SeqCst);
    }
}

fn dot_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>()
}

#[async_trait]
impl VectorIndex for FakeVectorIndex {
    async fn health_check(&self) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn add_document(
        &self,
        url: &str,
        embedding: Vec<f32>,
        metadata: RecordMetadata,
    ) -> Result<(), VectorStoreError> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(VectorStoreError::UpsertError("write refused".into()));
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(url.to_string(), (embedding, metadata));
        Ok(())
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        n_results: u64,
        publish_range: Option<(i64, i64)>,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        if self.fail_search.swap(false, Ordering::SeqCst) {
            return Err(VectorStoreError::SearchError("search exploded".into()));
        }

        let records = self.records.lock().unwrap();
        let mut hits: Vec<ScoredRecord> = records
            .iter()
            .filter(|(_, (_, m))| {
                publish_range.is_none_or(|(start, end)| {
                    m.publish_date >= start && m.publish_date <= end
                })
            })
            .map(|(url, (stored, m))| ScoredRecord {
                id: url.clone(),
                distance: dot_distance(embedding, stored),
                metadata: m.clone(),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n_results as usize);
        Ok(hits)
    }
}

/// Embedder returning a fixed vector per text, with optional stubbed
/// overrides. Any text containing [`EMBED_FAIL`] errors.
#[derive(Default)]
pub struct FakeEmbedder {
    stubs: Mutex<HashMap<String, Vec<f32>>>,
    pub calls: AtomicU32,
}

impl FakeEmbedder {
    pub fn stub(&self, text: &str, embedding: Vec<f32>) {
        self.stubs
            .lock()
            .unwrap()
            .insert(text.to_string(), embedding);
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn health_check(&self) -> Result<(), EmbeddingError> {
        Ok(())
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains(EMBED_FAIL) {
            return Err(EmbeddingError::ServerError("status 500: model crashed".into()));
        }
        if let Some(stubbed) = self.stubs.lock().unwrap().get(text) {
            return Ok(stubbed.clone());
        }
        Ok(vec![1.0, 0.0, 0.0])
    }
}
