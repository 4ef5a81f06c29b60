use super::{NodeTracker, Strategy, StrategyParams};

/// Breadth-first policy: every discovered node is selected and queued for
/// expansion until the output quota is met.
#[derive(Debug, Clone, Default)]
pub struct Eager {
    params: StrategyParams,
}

impl Eager {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl Strategy for Eager {
    fn params(&self) -> &StrategyParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut StrategyParams {
        &mut self.params
    }

    fn iteration(&mut self, new_ids: &[String], tracker: &mut NodeTracker) {
        tracker.select_and_traverse(new_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use serde_json::Map;
    use std::collections::HashSet;

    fn mk_node(id: &str, depth: usize) -> Node {
        Node {
            id: id.to_string(),
            content: id.to_string(),
            embedding: vec![1.0],
            metadata: Map::new(),
            depth,
            similarity_score: 0.0,
            incoming_edges: HashSet::new(),
            outgoing_edges: HashSet::new(),
            extra_metadata: Map::new(),
        }
    }

    #[test]
    fn test_eager_selects_and_queues_everything() {
        let mut strategy = Eager::default();
        let mut tracker = NodeTracker::new(10, None);
        tracker.insert_node(mk_node("a", 0));
        tracker.insert_node(mk_node("b", 0));

        strategy.iteration(&["a".to_string(), "b".to_string()], &mut tracker);

        assert_eq!(tracker.num_remaining(), 8);
        assert!(!tracker.should_stop());
        let selected = tracker.take_selected(usize::MAX);
        let ids: Vec<&str> = selected.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
