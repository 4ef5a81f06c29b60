use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::edges::Edge;

/// Annotation key for the depth a node was discovered at.
pub const DEPTH_KEY: &str = "_depth";
/// Annotation key for the cosine similarity to the query embedding.
pub const SIMILARITY_SCORE_KEY: &str = "_similarity_score";
/// Annotation key for a [`Scored`](crate::strategies::Scored) strategy score.
pub const SCORE_KEY: &str = "_score";
/// Annotation key for an [`Mmr`](crate::strategies::Mmr) strategy score.
pub const MMR_SCORE_KEY: &str = "_mmr_score";
/// Annotation key for the redundancy an Mmr selection was penalized with.
pub const REDUNDANCY_KEY: &str = "_redundancy";

/// Traversal-time view of a content.
///
/// Created once when the id is first discovered and never mutated afterward,
/// except for annotations written into `extra_metadata`.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Map<String, Value>,
    /// Distance from the seed set: 0 for seeds, otherwise one more than the
    /// depth of the first parent whose edge reached this node.
    pub depth: usize,
    /// Cosine similarity between this node's embedding and the query
    /// embedding.
    pub similarity_score: f32,
    pub incoming_edges: HashSet<Edge>,
    pub outgoing_edges: HashSet<Edge>,
    /// Strategy-written annotations such as `_depth`, `_similarity_score`
    /// and `_score`.
    pub extra_metadata: Map<String, Value>,
}

impl Node {
    /// Original document metadata merged with the annotations;
    /// `extra_metadata` wins on key conflicts.
    pub fn merged_metadata(&self) -> Map<String, Value> {
        let mut merged = self.metadata.clone();
        merged.extend(
            self.extra_metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merged_metadata_annotations_win() {
        let mut metadata = Map::new();
        metadata.insert("category".to_string(), json!("geo"));
        metadata.insert(DEPTH_KEY.to_string(), json!(99));
        let mut extra = Map::new();
        extra.insert(DEPTH_KEY.to_string(), json!(1));

        let node = Node {
            id: "a".to_string(),
            content: "x".to_string(),
            embedding: vec![],
            metadata,
            depth: 1,
            similarity_score: 0.0,
            incoming_edges: HashSet::new(),
            outgoing_edges: HashSet::new(),
            extra_metadata: extra,
        };

        let merged = node.merged_metadata();
        assert_eq!(merged["category"], json!("geo"));
        assert_eq!(merged[DEPTH_KEY], json!(1));
    }
}
