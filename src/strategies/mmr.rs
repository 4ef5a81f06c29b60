use serde_json::Value;

use super::{NodeTracker, Strategy, StrategyParams};
use crate::math::cosine_similarity;
use crate::node::{Node, MMR_SCORE_KEY, REDUNDANCY_KEY};

/// Maximal-marginal-relevance policy.
///
/// Every discovered node becomes a candidate. Each round selects the single
/// candidate maximizing `lambda_mult * similarity - (1 - lambda_mult) *
/// redundancy`, where redundancy is the highest similarity to any node
/// selected so far. Selection repeats within a round until a selected node
/// is successfully queued for expansion, so results keep flowing even when
/// the frontier has dried up.
pub struct Mmr {
    params: StrategyParams,
    lambda_mult: f32,
    min_mmr_score: Option<f32>,
    candidates: Vec<Candidate>,
    selected_embeddings: Vec<Vec<f32>>,
}

struct Candidate {
    id: String,
    embedding: Vec<f32>,
    similarity: f32,
    redundancy: f32,
}

impl Mmr {
    pub fn new(params: StrategyParams) -> Self {
        Self {
            params,
            lambda_mult: 0.5,
            min_mmr_score: None,
            candidates: Vec::new(),
            selected_embeddings: Vec::new(),
        }
    }

    /// Weight between query similarity (1.0) and diversity (0.0).
    pub fn with_lambda_mult(mut self, lambda_mult: f32) -> Self {
        self.lambda_mult = lambda_mult;
        self
    }

    /// Stop selecting once the best candidate scores below this bound.
    pub fn with_min_mmr_score(mut self, min_mmr_score: f32) -> Self {
        self.min_mmr_score = Some(min_mmr_score);
        self
    }

    fn mmr_score(&self, candidate: &Candidate) -> f32 {
        self.lambda_mult * candidate.similarity - (1.0 - self.lambda_mult) * candidate.redundancy
    }

    fn best_candidate(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, candidate) in self.candidates.iter().enumerate() {
            let score = self.mmr_score(candidate);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Select the best remaining candidate, if any clears `min_mmr_score`.
    /// Returns how many nodes the selection queued for expansion, or `None`
    /// when no candidate may be selected.
    fn select_next(&mut self, tracker: &mut NodeTracker, expand: bool) -> Option<usize> {
        let index = self.best_candidate()?;
        let score = self.mmr_score(&self.candidates[index]);
        if let Some(min_score) = self.min_mmr_score {
            if score < min_score {
                return None;
            }
        }

        let candidate = self.candidates.remove(index);
        tracker.annotate(&candidate.id, MMR_SCORE_KEY, Value::from(score as f64));
        tracker.annotate(
            &candidate.id,
            REDUNDANCY_KEY,
            Value::from(candidate.redundancy as f64),
        );
        let id = std::slice::from_ref(&candidate.id);
        let queued = if expand {
            tracker.select_and_traverse(id)
        } else {
            tracker.select(id);
            0
        };

        for remaining in &mut self.candidates {
            let similarity =
                cosine_similarity(&remaining.embedding, &candidate.embedding).unwrap_or(0.0);
            remaining.redundancy = remaining.redundancy.max(similarity);
        }
        self.selected_embeddings.push(candidate.embedding);
        Some(queued)
    }
}

impl Default for Mmr {
    fn default() -> Self {
        Self::new(StrategyParams::default())
    }
}

impl Strategy for Mmr {
    fn params(&self) -> &StrategyParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut StrategyParams {
        &mut self.params
    }

    fn iteration(&mut self, new_ids: &[String], tracker: &mut NodeTracker) {
        for id in new_ids {
            let Some(node) = tracker.node(id) else {
                continue;
            };
            // New ids are first discoveries, so candidates are never
            // re-added once known.
            let redundancy = if self.selected_embeddings.is_empty() {
                0.0
            } else {
                self.selected_embeddings
                    .iter()
                    .map(|selected| cosine_similarity(&node.embedding, selected).unwrap_or(0.0))
                    .fold(f32::NEG_INFINITY, f32::max)
            };
            self.candidates.push(Candidate {
                id: id.clone(),
                embedding: node.embedding.clone(),
                similarity: node.similarity_score,
                redundancy,
            });
        }

        while tracker.num_remaining() > 0 {
            match self.select_next(tracker, true) {
                // Wait for the expansion results before selecting further.
                Some(queued) if queued > 0 => return,
                Some(_) => {}
                None => return,
            }
        }
    }

    /// Keep selecting leftover candidates once the frontier has dried up,
    /// then return the selection in order.
    fn finalize(&mut self, tracker: &mut NodeTracker) -> Vec<Node> {
        while tracker.num_remaining() > 0 {
            if self.select_next(tracker, false).is_none() {
                break;
            }
        }
        tracker.take_selected(self.params.select_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use serde_json::Map;
    use std::collections::HashSet;

    fn mk_node(id: &str, embedding: Vec<f32>, similarity: f32) -> Node {
        Node {
            id: id.to_string(),
            content: id.to_string(),
            embedding,
            metadata: Map::new(),
            depth: 0,
            similarity_score: similarity,
            incoming_edges: HashSet::new(),
            outgoing_edges: HashSet::new(),
            extra_metadata: Map::new(),
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_penalizes_redundant_candidates() {
        let mut strategy = Mmr::new(StrategyParams {
            select_k: 2,
            max_depth: Some(0),
            ..Default::default()
        });
        let mut tracker = NodeTracker::new(2, Some(0));
        // "close" nearly duplicates "best"; "diverse" is orthogonal.
        tracker.insert_node(mk_node("best", vec![1.0, 0.0], 0.95));
        tracker.insert_node(mk_node("close", vec![0.99, 0.05], 0.94));
        tracker.insert_node(mk_node("diverse", vec![0.0, 1.0], 0.6));

        strategy.iteration(&ids(&["best", "close", "diverse"]), &mut tracker);

        let nodes = tracker.take_selected(usize::MAX);
        let got: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(got, vec!["best", "diverse"]);
        assert_eq!(nodes[0].extra_metadata[REDUNDANCY_KEY], Value::from(0.0));
        assert!(nodes[1].extra_metadata[MMR_SCORE_KEY].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_min_mmr_score_stops_selection() {
        let mut strategy = Mmr::new(StrategyParams {
            select_k: 3,
            max_depth: Some(0),
            ..Default::default()
        })
        .with_min_mmr_score(0.4);
        let mut tracker = NodeTracker::new(3, Some(0));
        tracker.insert_node(mk_node("strong", vec![1.0, 0.0], 0.9));
        tracker.insert_node(mk_node("weak", vec![0.0, 1.0], 0.1));

        strategy.iteration(&ids(&["strong", "weak"]), &mut tracker);

        let nodes = tracker.take_selected(usize::MAX);
        let got: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(got, vec!["strong"]);
    }

    #[test]
    fn test_selects_until_one_traversal_is_queued() {
        let mut strategy = Mmr::new(StrategyParams {
            select_k: 3,
            ..Default::default()
        });
        // No max_depth: the first selection queues, ending the round.
        let mut tracker = NodeTracker::new(3, None);
        tracker.insert_node(mk_node("a", vec![1.0, 0.0], 0.9));
        tracker.insert_node(mk_node("b", vec![0.0, 1.0], 0.8));

        strategy.iteration(&ids(&["a", "b"]), &mut tracker);

        assert_eq!(tracker.take_selected(usize::MAX).len(), 1);
        assert_eq!(tracker.drain_frontier(), vec!["a".to_string()]);
    }
}
