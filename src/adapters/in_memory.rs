//! In-memory reference adapter.
//!
//! Backs the store with a plain id-to-content map. Small and slow, but its
//! filter and similarity semantics define the behavioral contract every
//! other adapter must satisfy.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;

use super::{Adapter, AdapterOptions, MetadataFilter};
use crate::content::Content;
use crate::edges::resolve_path;
use crate::error::{RagraphError, Result};
use crate::math::cosine_similarity;

type EmbeddingFn = dyn Fn(&str) -> Vec<f32> + Send + Sync;

/// Reference adapter over an in-memory content collection.
pub struct InMemory {
    embedding: Box<EmbeddingFn>,
    contents: Vec<Content>,
    by_id: HashMap<String, usize>,
}

impl InMemory {
    /// Build a store from an embedding function and a content collection.
    ///
    /// Duplicate ids keep their first position with the last content
    /// winning. Contents must carry a non-empty id and embedding.
    pub fn new(
        embedding: impl Fn(&str) -> Vec<f32> + Send + Sync + 'static,
        contents: Vec<Content>,
    ) -> Result<Self> {
        let mut store = Self {
            embedding: Box::new(embedding),
            contents: Vec::new(),
            by_id: HashMap::new(),
        };
        for content in contents {
            if content.id.is_empty() {
                return Err(RagraphError::MissingId);
            }
            if content.embedding.is_empty() {
                return Err(RagraphError::MissingEmbedding(content.id));
            }
            match store.by_id.get(&content.id) {
                Some(&index) => store.contents[index] = content,
                None => {
                    store.by_id.insert(content.id.clone(), store.contents.len());
                    store.contents.push(content);
                }
            }
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Filter matching contract: dotted keys perform nested lookup; a filter
    /// value matches when the content value equals it or, for array-valued
    /// content, is an element of that array. Absent keys fail the match.
    fn matches(content: &Content, filter: Option<&MetadataFilter>) -> bool {
        let Some(filter) = filter else {
            return true;
        };
        filter.iter().all(|(key, expected)| {
            match resolve_path(&content.metadata, key) {
                Some(actual) if actual == expected => true,
                Some(Value::Array(items)) => items.iter().any(|item| item == expected),
                _ => false,
            }
        })
    }
}

#[async_trait]
impl Adapter for InMemory {
    async fn search_with_embedding(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
        options: &AdapterOptions,
    ) -> Result<(Vec<f32>, Vec<Content>)> {
        let embedding = (self.embedding)(query);
        let results = self.search(&embedding, k, filter, options).await?;
        Ok((embedding, results))
    }

    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
        _options: &AdapterOptions,
    ) -> Result<Vec<Content>> {
        let mut scored: Vec<(f32, &Content)> = Vec::new();
        for content in &self.contents {
            if !Self::matches(content, filter) {
                continue;
            }
            let similarity = cosine_similarity(embedding, &content.embedding)?;
            scored.push((similarity, content));
        }
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(k).map(|(_, c)| c.clone()).collect())
    }

    async fn get(
        &self,
        ids: &[String],
        filter: Option<&MetadataFilter>,
        _options: &AdapterOptions,
    ) -> Result<Vec<Content>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut results = Vec::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(&index) = self.by_id.get(id) {
                let content = &self.contents[index];
                if Self::matches(content, filter) {
                    results.push(content.clone());
                }
            }
        }
        Ok(results)
    }
}
