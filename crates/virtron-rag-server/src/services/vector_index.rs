use anyhow::Result;
use tokio::sync::RwLock;
use tracing::debug;

use crate::services::providers::{IndexedDocument, SearchHit, VectorSearchProvider};
use crate::utils::similarity::cosine_similarity_or_zero;

/// Reference documents held in process, searched by brute-force cosine similarity
#[derive(Default)]
pub struct InMemoryVectorIndex {
    documents: RwLock<Vec<IndexedDocument>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VectorSearchProvider for InMemoryVectorIndex {
    /// Upsert by id
    async fn add(&self, document: IndexedDocument) -> Result<()> {
        if document.vector.is_empty() {
            anyhow::bail!("Document {} has an empty vector", document.id);
        }

        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let documents = self.documents.read().await;

        let mut hits: Vec<SearchHit> = documents
            .iter()
            .map(|doc| SearchHit {
                id: doc.id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                score: cosine_similarity_or_zero(query_vector, &doc.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);

        debug!("Vector search returned {} of {} documents", hits.len(), documents.len());
        Ok(hits)
    }

    async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, vector: Vec<f32>) -> IndexedDocument {
        IndexedDocument {
            id: id.to_string(),
            text: format!("text of {}", id),
            vector,
            metadata: json!({ "source": "test" }),
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let index = InMemoryVectorIndex::new();
        index.add(doc("a", vec![1.0, 0.0])).await.unwrap();
        index.add(doc("b", vec![0.0, 1.0])).await.unwrap();
        index.add(doc("c", vec![0.7, 0.7])).await.unwrap();

        let hits = index.search(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_add_upserts_by_id() {
        let index = InMemoryVectorIndex::new();
        index.add(doc("a", vec![1.0, 0.0])).await.unwrap();
        index.add(doc("a", vec![0.0, 1.0])).await.unwrap();
        assert_eq!(index.len().await, 1);

        let hits = index.search(&[0.0, 1.0], 1).await.unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_vector_rejected() {
        let index = InMemoryVectorIndex::new();
        assert!(index.add(doc("a", vec![])).await.is_err());
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn test_search_empty_index() {
        let index = InMemoryVectorIndex::new();
        assert!(index.search(&[1.0], 3).await.unwrap().is_empty());
    }
}
