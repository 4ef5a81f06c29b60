//! Metadata-driven edge extraction.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::{Edge, EdgeSpec, EdgeValue, Edges, Selector};
use crate::content::Content;

/// Look up a metadata value by key, trying the literal key first and then
/// walking dotted segments through nested objects.
pub(crate) fn resolve_path<'a>(metadata: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = metadata.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = metadata.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Derives incoming and outgoing edges from content metadata according to a
/// list of [`EdgeSpec`]s.
///
/// For a spec `(source, target)` the outgoing edges carry the values of the
/// content's `source` selector and the incoming edges the values of its
/// `target` selector; both are keyed by the target selector, so an outgoing
/// edge of one content structurally equals the incoming edge of each content
/// it can reach.
#[derive(Debug, Clone)]
pub struct MetadataEdgeFunction {
    specs: Vec<EdgeSpec>,
}

impl MetadataEdgeFunction {
    pub fn new(specs: Vec<EdgeSpec>) -> Self {
        Self { specs }
    }

    /// Parse `(source, target)` selector string pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> crate::Result<Self> {
        let specs = pairs
            .iter()
            .map(|(source, target)| EdgeSpec::new(source, target))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self::new(specs))
    }

    pub fn specs(&self) -> &[EdgeSpec] {
        &self.specs
    }

    /// Resolve a selector against a content, fanning arrays out into one
    /// value per scalar element. Missing fields resolve to nothing;
    /// non-scalar values are skipped with a warning.
    fn resolve(content: &Content, selector: &Selector) -> Vec<EdgeValue> {
        let path = match selector {
            Selector::Id => return vec![EdgeValue::Str(content.id.clone())],
            Selector::Field(path) => path,
        };
        let Some(value) = resolve_path(&content.metadata, path) else {
            return Vec::new();
        };
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| {
                    let scalar = EdgeValue::from_json(item);
                    if scalar.is_none() {
                        log::warn!("Unsupported item value {item} in '{path}'");
                    }
                    scalar
                })
                .collect(),
            other => match EdgeValue::from_json(other) {
                Some(scalar) => vec![scalar],
                None => {
                    log::warn!("Unsupported value {other} in '{path}'");
                    Vec::new()
                }
            },
        }
    }

    /// Build the edge for one resolved value. The target selector names the
    /// edge: `$id` targets produce id edges and only accept string values.
    fn edge_for(target: &Selector, value: EdgeValue) -> Option<Edge> {
        match target {
            Selector::Id => match value {
                EdgeValue::Str(id) => Some(Edge::Id(id)),
                other => {
                    log::warn!("Unsupported id value {:?} for '$id' edge", other);
                    None
                }
            },
            Selector::Field(field) => Some(Edge::Metadata {
                field: field.clone(),
                value,
            }),
        }
    }

    fn side(&self, content: &Content, incoming: bool) -> HashSet<Edge> {
        let mut edges = HashSet::new();
        for spec in &self.specs {
            let resolved = if incoming {
                Self::resolve(content, &spec.target)
            } else {
                Self::resolve(content, &spec.source)
            };
            for value in resolved {
                if let Some(edge) = Self::edge_for(&spec.target, value) {
                    edges.insert(edge);
                }
            }
        }
        edges
    }
}

impl super::EdgeFunction for MetadataEdgeFunction {
    fn edges(&self, content: &Content) -> Edges {
        Edges {
            incoming: self.side(content, true),
            outgoing: self.side(content, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgeFunction;
    use serde_json::json;

    fn mk_content(metadata: Value) -> Content {
        let metadata = metadata.as_object().cloned().unwrap_or_default();
        Content::new("id", "testing", vec![]).with_metadata(metadata)
    }

    fn edge_set(edges: &[Edge]) -> HashSet<Edge> {
        edges.iter().cloned().collect()
    }

    #[test]
    fn test_from_pairs_keeps_specs() {
        let function =
            MetadataEdgeFunction::from_pairs(&[("a", "a"), ("b", "c"), ("b", "b")]).unwrap();
        assert_eq!(function.specs().len(), 3);
        assert_eq!(function.specs()[1], EdgeSpec::new("b", "c").unwrap());
    }

    #[test]
    fn test_from_pairs_rejects_bad_selector() {
        assert!(MetadataEdgeFunction::from_pairs(&[("a", "$nope")]).is_err());
        assert!(MetadataEdgeFunction::from_pairs(&[("", "a")]).is_err());
    }

    #[test]
    fn test_scalar_fields() {
        let function = MetadataEdgeFunction::from_pairs(&[("href", "url")]).unwrap();
        let edges = function.edges(&mk_content(json!({"href": "a", "url": "b"})));
        assert_eq!(edges.incoming, edge_set(&[Edge::metadata("url", "b")]));
        assert_eq!(edges.outgoing, edge_set(&[Edge::metadata("url", "a")]));
    }

    #[test]
    fn test_array_fan_out() {
        let function = MetadataEdgeFunction::from_pairs(&[("href", "url")]).unwrap();

        let edges = function.edges(&mk_content(json!({"href": ["a", "c"], "url": "b"})));
        assert_eq!(edges.incoming, edge_set(&[Edge::metadata("url", "b")]));
        assert_eq!(
            edges.outgoing,
            edge_set(&[Edge::metadata("url", "a"), Edge::metadata("url", "c")])
        );

        let edges = function.edges(&mk_content(json!({"href": ["a", "c"], "url": ["b", "d"]})));
        assert_eq!(
            edges.incoming,
            edge_set(&[Edge::metadata("url", "b"), Edge::metadata("url", "d")])
        );
        assert_eq!(
            edges.outgoing,
            edge_set(&[Edge::metadata("url", "a"), Edge::metadata("url", "c")])
        );
    }

    #[test]
    fn test_nested_lookup() {
        let function = MetadataEdgeFunction::from_pairs(&[("a.b", "b.c")]).unwrap();
        let edges = function.edges(&mk_content(json!({"a": {"b": 5}, "b": {"c": 7}})));
        assert_eq!(
            edges.incoming,
            edge_set(&[Edge::metadata("b.c", EdgeValue::Int(7))])
        );
        assert_eq!(
            edges.outgoing,
            edge_set(&[Edge::metadata("b.c", EdgeValue::Int(5))])
        );
    }

    #[test]
    fn test_literal_dotted_key_wins_over_nested() {
        let function = MetadataEdgeFunction::from_pairs(&[("a.b", "other")]).unwrap();
        let edges = function.edges(&mk_content(json!({"a.b": "flat", "a": {"b": "nested"}})));
        assert_eq!(edges.outgoing, edge_set(&[Edge::metadata("other", "flat")]));
    }

    #[test]
    fn test_link_to_id() {
        let function = MetadataEdgeFunction::from_pairs(&[("mentions", "$id")]).unwrap();
        let edges = function.edges(&mk_content(json!({"mentions": ["a", "c"]})));
        assert_eq!(edges.incoming, edge_set(&[Edge::id("id")]));
        assert_eq!(edges.outgoing, edge_set(&[Edge::id("a"), Edge::id("c")]));
    }

    #[test]
    fn test_link_from_id() {
        let function = MetadataEdgeFunction::from_pairs(&[("$id", "mentions")]).unwrap();
        let edges = function.edges(&mk_content(json!({"mentions": ["a", "c"]})));
        assert_eq!(
            edges.incoming,
            edge_set(&[Edge::metadata("mentions", "a"), Edge::metadata("mentions", "c")])
        );
        assert_eq!(edges.outgoing, edge_set(&[Edge::metadata("mentions", "id")]));
    }

    #[test]
    fn test_missing_field_emits_nothing() {
        let function = MetadataEdgeFunction::from_pairs(&[("href", "url")]).unwrap();
        let edges = function.edges(&mk_content(json!({"unrelated": 1})));
        assert!(edges.incoming.is_empty());
        assert!(edges.outgoing.is_empty());
    }

    #[test]
    fn test_unsupported_values_skipped() {
        let function = MetadataEdgeFunction::from_pairs(&[("href", "url")]).unwrap();

        let edges = function.edges(&mk_content(json!({"href": null})));
        assert!(edges.outgoing.is_empty());

        let edges = function.edges(&mk_content(json!({"href": [null, "a"]})));
        assert_eq!(edges.outgoing, edge_set(&[Edge::metadata("url", "a")]));
    }

    #[test]
    fn test_non_string_id_values_skipped() {
        let function = MetadataEdgeFunction::from_pairs(&[("mentions", "$id")]).unwrap();
        let edges = function.edges(&mk_content(json!({"mentions": [7, "a"]})));
        assert_eq!(edges.outgoing, edge_set(&[Edge::id("a")]));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let function =
            MetadataEdgeFunction::from_pairs(&[("href", "url"), ("$id", "mentions")]).unwrap();
        let content = mk_content(json!({"href": ["a", "c"], "url": "b", "mentions": ["x"]}));
        assert_eq!(function.edges(&content), function.edges(&content));
    }

    #[test]
    fn test_resolve_path_nested() {
        let metadata = json!({"a": {"b": {"c": 3}}}).as_object().cloned().unwrap();
        assert_eq!(resolve_path(&metadata, "a.b.c"), Some(&json!(3)));
        assert_eq!(resolve_path(&metadata, "a.b"), Some(&json!({"c": 3})));
        assert_eq!(resolve_path(&metadata, "a.x"), None);
        assert_eq!(resolve_path(&metadata, "missing"), None);
    }
}
