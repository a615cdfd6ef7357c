//! Vector index access over Qdrant.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, Range,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use uuid::Uuid;

use crate::error::VectorStoreError;
use crate::models::{RecordMetadata, ScoredRecord, VectorStoreConfig};

/// Add/query access to the vector index, narrowed to what the worker and the
/// duplicate detector consume.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Heartbeat probe, used before first use.
    async fn health_check(&self) -> Result<(), VectorStoreError>;

    /// Create the collection when missing; a no-op when present.
    async fn ensure_collection(&self) -> Result<(), VectorStoreError>;

    /// Upsert one embedding keyed by document url. Writing the same url
    /// again overwrites in place.
    async fn add_document(
        &self,
        url: &str,
        embedding: Vec<f32>,
        metadata: RecordMetadata,
    ) -> Result<(), VectorStoreError>;

    /// Nearest neighbors of `embedding`, optionally filtered to records
    /// whose publish_date (epoch seconds) falls inside the inclusive range.
    /// Results come back in the store's ranking order.
    async fn search_similar(
        &self,
        embedding: &[f32],
        n_results: u64,
        publish_range: Option<(i64, i64)>,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError>;
}

/// Qdrant vector index backend.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    embedding_dim: u64,
}

impl QdrantVectorStore {
    pub fn new(config: &VectorStoreConfig, embedding_dim: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedding_dim,
        })
    }

    /// Qdrant point ids must be UUIDs or integers, so "keyed by url" becomes
    /// a deterministic UUID digest of the url: the same url always lands on
    /// the same point, making every write an idempotent upsert.
    pub fn point_id(url: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()).to_string()
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(false)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }
}

fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn payload_i64(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> i64 {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(qdrant_client::qdrant::value::Kind::IntegerValue(n)) => Some(*n),
            _ => None,
        })
        .unwrap_or_default()
}

#[async_trait]
impl VectorIndex for QdrantVectorStore {
    async fn health_check(&self) -> Result<(), VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| ())
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn add_document(
        &self,
        url: &str,
        embedding: Vec<f32>,
        metadata: RecordMetadata,
    ) -> Result<(), VectorStoreError> {
        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("title".to_string(), metadata.title.into());
        payload.insert("url".to_string(), metadata.url.into());
        payload.insert("publish_date".to_string(), metadata.publish_date.into());

        let point = PointStruct::new(Self::point_id(url), embedding, payload);
        let upsert = UpsertPointsBuilder::new(&self.collection, vec![point]);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        n_results: u64,
        publish_range: Option<(i64, i64)>,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, embedding.to_vec(), n_results)
                .with_payload(true);

        if let Some((start, end)) = publish_range {
            let range = Range {
                gte: Some(start as f64),
                lte: Some(end as f64),
                ..Default::default()
            };
            search_builder =
                search_builder.filter(Filter::must([Condition::range("publish_date", range)]));
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let records = results
            .result
            .into_iter()
            .map(|point| {
                let metadata = RecordMetadata {
                    title: payload_str(&point.payload, "title"),
                    url: payload_str(&point.payload, "url"),
                    publish_date: payload_i64(&point.payload, "publish_date"),
                };

                // The collection is cosine, so Qdrant reports similarity;
                // thresholds are written against distances.
                ScoredRecord {
                    id: metadata.url.clone(),
                    distance: 1.0 - point.score,
                    metadata,
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_deterministic_per_url() {
        let a = QdrantVectorStore::point_id("https://example.com/story-1");
        let b = QdrantVectorStore::point_id("https://example.com/story-1");
        let c = QdrantVectorStore::point_id("https://example.com/story-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 36);
    }
}
