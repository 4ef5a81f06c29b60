use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_mime_type() -> String {
    "text/plain".to_string()
}

/// A single retrievable document as stored by an adapter.
///
/// Immutable once constructed. `id` uniquely identifies a logical document
/// within a store; all embeddings from the same store share one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Unique identifier within the store.
    pub id: String,
    /// Document text.
    pub content: String,
    /// Dense embedding of the text.
    pub embedding: Vec<f32>,
    /// JSON-like metadata (scalars, arrays, nested mappings).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// MIME type of the content, `text/plain` unless known otherwise.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

impl Content {
    /// Create a content with a precomputed embedding and empty metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding,
            metadata: Map::new(),
            mime_type: default_mime_type(),
        }
    }

    /// Create a content by applying `embed` to the text.
    pub fn with_embedding(
        id: impl Into<String>,
        content: impl Into<String>,
        embed: impl Fn(&str) -> Vec<f32>,
    ) -> Self {
        let content = content.into();
        let embedding = embed(&content);
        Self::new(id, content, embedding)
    }

    /// Replace the metadata mapping.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}
