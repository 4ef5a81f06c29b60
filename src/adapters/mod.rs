//! Adapter contract: the uniform query surface the traversal uses to talk
//! to a vector store.

pub mod in_memory;

pub use in_memory::InMemory;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::content::Content;
use crate::edges::Edge;
use crate::error::Result;
use crate::math::top_k;

/// Metadata filter applied to every adapter call. Keys may be dotted for
/// nested lookup; a value matches when the content value equals it or, for
/// array-valued content, contains it.
pub type MetadataFilter = Map<String, Value>;

/// Opaque options forwarded to the adapter on every call. The engine never
/// interprets these.
#[derive(Debug, Clone, Default)]
pub struct AdapterOptions {
    pub extra: Map<String, Value>,
}

/// Facade over a vector store.
///
/// Adapters may be shared across traversals and must be reentrant for read
/// operations. Implementations over external stores are free to translate
/// the filter to a native query language as long as they preserve the
/// matching semantics of the in-memory reference adapter.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Embed `query` and return the top-`k` similar contents honoring the
    /// filter, along with the embedding that was used. The engine relies on
    /// that embedding to score every node discovered later in the same
    /// space.
    async fn search_with_embedding(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
        options: &AdapterOptions,
    ) -> Result<(Vec<f32>, Vec<Content>)>;

    /// Return the top-`k` contents similar to a caller-supplied embedding.
    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
        options: &AdapterOptions,
    ) -> Result<Vec<Content>>;

    /// Return at most one content per id, mirroring the input order.
    /// Missing ids are silently omitted, as are contents failing the filter.
    async fn get(
        &self,
        ids: &[String],
        filter: Option<&MetadataFilter>,
        options: &AdapterOptions,
    ) -> Result<Vec<Content>>;

    /// Return the top-`k` contents adjacent to any of `edges`, ranked by
    /// similarity to `query_embedding`.
    ///
    /// The default runs one filtered search per metadata edge (conjoining
    /// the edge's field/value pair onto the base filter), a single get for
    /// all accumulated id edges, and merges everything through a global
    /// top-k.
    async fn adjacent(
        &self,
        edges: &[Edge],
        query_embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
        options: &AdapterOptions,
    ) -> Result<Vec<Content>> {
        let mut ids: Vec<String> = Vec::new();
        let mut edge_filters: Vec<MetadataFilter> = Vec::new();
        for edge in edges {
            match edge {
                Edge::Id(id) => ids.push(id.clone()),
                Edge::Metadata { field, value } => {
                    let mut edge_filter = filter.cloned().unwrap_or_default();
                    edge_filter.insert(field.clone(), value.to_json());
                    edge_filters.push(edge_filter);
                }
            }
        }

        let searches = edge_filters.iter().map(|edge_filter| {
            self.search(query_embedding, k, Some(edge_filter), options)
        });
        let (searched, fetched) = tokio::join!(
            futures_util::future::try_join_all(searches),
            async {
                if ids.is_empty() {
                    Ok(Vec::new())
                } else {
                    self.get(&ids, filter, options).await
                }
            }
        );

        let mut candidates: Vec<Content> = searched?.into_iter().flatten().collect();
        candidates.extend(fetched?);
        top_k(candidates, query_embedding, k)
    }
}
