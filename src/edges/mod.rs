//! Edge model: tagged connections between documents and the declarative
//! specs that induce them from metadata.

mod metadata;

pub use metadata::MetadataEdgeFunction;
pub(crate) use metadata::resolve_path;

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::Content;
use crate::error::{RagraphError, Result};

/// An `f64` wrapper with bit-pattern equality and hashing, so edge values
/// can live in hash sets and maps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedF64(pub f64);

impl PartialEq for OrderedF64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedF64 {}

impl Hash for OrderedF64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Scalar value carried by a metadata edge, normalized to a canonical form
/// with structural equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(OrderedF64),
}

impl EdgeValue {
    /// Convert a JSON scalar to an edge value. Arrays, objects and null are
    /// not scalars and return `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(EdgeValue::Str(s.clone())),
            Value::Bool(b) => Some(EdgeValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(EdgeValue::Int(i))
                } else {
                    n.as_f64().map(|f| EdgeValue::Float(OrderedF64(f)))
                }
            }
            _ => None,
        }
    }

    /// Convert back to a JSON value, e.g. for use in a metadata filter.
    pub fn to_json(&self) -> Value {
        match self {
            EdgeValue::Str(s) => Value::String(s.clone()),
            EdgeValue::Bool(b) => Value::Bool(*b),
            EdgeValue::Int(i) => Value::from(*i),
            EdgeValue::Float(f) => Value::from(f.0),
        }
    }
}

impl From<&str> for EdgeValue {
    fn from(s: &str) -> Self {
        EdgeValue::Str(s.to_string())
    }
}

/// A tagged connection. A `Metadata` edge matches any content whose
/// `metadata[field]` equals `value`, or contains `value` when that entry is
/// an array. An `Id` edge matches the single content with that id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    Metadata { field: String, value: EdgeValue },
    Id(String),
}

impl Edge {
    /// Convenience constructor for a metadata edge.
    pub fn metadata(field: impl Into<String>, value: impl Into<EdgeValue>) -> Self {
        Edge::Metadata {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Convenience constructor for an id edge.
    pub fn id(id: impl Into<String>) -> Self {
        Edge::Id(id.into())
    }
}

/// The incoming and outgoing edge sets of one content. Duplicates collapse
/// by structural equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Edges {
    pub incoming: HashSet<Edge>,
    pub outgoing: HashSet<Edge>,
}

impl Edges {
    pub fn new(incoming: HashSet<Edge>, outgoing: HashSet<Edge>) -> Self {
        Self { incoming, outgoing }
    }
}

/// One side of an edge spec: either a metadata field (dotted paths perform
/// nested lookup) or the document id, written `$id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    Id,
    Field(String),
}

impl Selector {
    /// Parse a raw selector string. `$id` is the only recognized sentinel.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == "$id" {
            Ok(Selector::Id)
        } else if raw.is_empty() {
            Err(RagraphError::InvalidEdgeSpec(
                "selector must not be empty".to_string(),
            ))
        } else if raw.starts_with('$') {
            Err(RagraphError::InvalidEdgeSpec(format!(
                "unknown sentinel '{raw}', expected '$id' or a field name"
            )))
        } else {
            Ok(Selector::Field(raw.to_string()))
        }
    }
}

/// A declarative pair of selectors defining a symmetric edge schema.
///
/// A spec `(x, y)` declares: my `x` values are outgoing edges reaching
/// documents whose `y` matches, and my `y` values are incoming edges
/// reachable from documents whose `x` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: Selector,
    pub target: Selector,
}

impl EdgeSpec {
    /// Parse a `(source, target)` selector pair.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        Ok(Self {
            source: Selector::parse(source)?,
            target: Selector::parse(target)?,
        })
    }
}

/// Maps a content to its incoming and outgoing edges.
///
/// Implemented by [`MetadataEdgeFunction`]; wrap a closure in [`EdgeFn`]
/// for ad-hoc schemas.
pub trait EdgeFunction: Send + Sync {
    fn edges(&self, content: &Content) -> Edges;
}

/// Adapts a `Fn(&Content) -> Edges` closure into an [`EdgeFunction`].
pub struct EdgeFn<F>(pub F);

impl<F> EdgeFunction for EdgeFn<F>
where
    F: Fn(&Content) -> Edges + Send + Sync,
{
    fn edges(&self, content: &Content) -> Edges {
        (self.0)(content)
    }
}
