use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde_json::Value;

use super::{NodeTracker, Strategy, StrategyParams};
use crate::node::{Node, SCORE_KEY};

type Scorer = dyn Fn(&Node) -> f32 + Send;

/// A node id queued with the score a [`Scored`] strategy gave it. Max-heap
/// ordering over the score, ties broken by id.
struct Candidate {
    score: f32,
    id: String,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Policy ranking every discovered node with a caller-supplied scorer.
///
/// Each round pushes the new nodes into a max-heap and pops up to the
/// remaining quota (optionally capped per round), selecting and expanding
/// the highest-scoring nodes first. Finalization re-sorts the selection by
/// `_score` descending.
pub struct Scored {
    params: StrategyParams,
    scorer: Box<Scorer>,
    per_iteration_limit: Option<usize>,
    heap: BinaryHeap<Candidate>,
}

impl Scored {
    pub fn new(scorer: impl Fn(&Node) -> f32 + Send + 'static, params: StrategyParams) -> Self {
        Self {
            params,
            scorer: Box::new(scorer),
            per_iteration_limit: None,
            heap: BinaryHeap::new(),
        }
    }

    /// Cap how many nodes may be selected in a single round.
    pub fn with_per_iteration_limit(mut self, limit: usize) -> Self {
        self.per_iteration_limit = Some(limit);
        self
    }
}

impl Strategy for Scored {
    fn params(&self) -> &StrategyParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut StrategyParams {
        &mut self.params
    }

    fn iteration(&mut self, new_ids: &[String], tracker: &mut NodeTracker) {
        for id in new_ids {
            if let Some(node) = tracker.node(id) {
                let score = (self.scorer)(node);
                self.heap.push(Candidate {
                    score,
                    id: id.clone(),
                });
            }
        }

        let mut budget = tracker.num_remaining();
        if let Some(limit) = self.per_iteration_limit {
            budget = budget.min(limit);
        }
        for _ in 0..budget {
            let Some(candidate) = self.heap.pop() else {
                break;
            };
            tracker.annotate(&candidate.id, SCORE_KEY, Value::from(candidate.score as f64));
            tracker.select_and_traverse(std::slice::from_ref(&candidate.id));
        }
    }

    fn finalize(&mut self, tracker: &mut NodeTracker) -> Vec<Node> {
        let score_of = |node: &Node| {
            node.extra_metadata
                .get(SCORE_KEY)
                .and_then(Value::as_f64)
                .unwrap_or(f64::NEG_INFINITY)
        };
        let mut nodes = tracker.take_selected(usize::MAX);
        nodes.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));
        nodes.truncate(self.params.select_k);
        nodes
    }
}
