//! Frontier policies: which discovered nodes are selected for output and
//! which are expanded further.

mod eager;
mod mmr;
mod scored;
mod tracker;

pub use eager::Eager;
pub use mmr::Mmr;
pub use scored::Scored;
pub use tracker::NodeTracker;

use crate::node::Node;

/// Scalar knobs shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyParams {
    /// Maximum number of nodes in the output.
    pub select_k: usize,
    /// Seeds fetched by similarity search.
    pub start_k: usize,
    /// Maximum contents fetched per expansion round.
    pub adjacent_k: usize,
    /// Optional bound on the depth of traversed nodes.
    pub max_depth: Option<usize>,
    /// Optional budget of distinct outgoing edges visited across all rounds.
    pub max_traverse: Option<usize>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            select_k: 5,
            start_k: 4,
            adjacent_k: 10,
            max_depth: None,
            max_traverse: None,
        }
    }
}

/// A traversal frontier policy.
///
/// `iteration` is invoked once per round with the ids of newly materialized
/// nodes and must advance the tracker through `select` / `traverse` /
/// `select_and_traverse`. `finalize` is called once at the end; the default
/// returns the first `select_k` selected nodes in selection order.
pub trait Strategy: Send {
    fn params(&self) -> &StrategyParams;

    fn params_mut(&mut self) -> &mut StrategyParams;

    fn iteration(&mut self, new_ids: &[String], tracker: &mut NodeTracker);

    fn finalize(&mut self, tracker: &mut NodeTracker) -> Vec<Node> {
        tracker.take_selected(self.params().select_k)
    }
}

/// Overrides applied to a base strategy by [`build`].
#[derive(Debug, Clone, Default)]
pub struct StrategyOptions {
    /// Legacy alias for `select_k`; an explicit `select_k` wins.
    pub k: Option<usize>,
    pub select_k: Option<usize>,
    pub start_k: Option<usize>,
    pub adjacent_k: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_traverse: Option<usize>,
}

/// Return `strategy` with the given overrides applied.
pub fn build(mut strategy: Box<dyn Strategy>, options: StrategyOptions) -> Box<dyn Strategy> {
    let params = strategy.params_mut();
    if let Some(k) = options.k {
        params.select_k = k;
    }
    if let Some(select_k) = options.select_k {
        params.select_k = select_k;
    }
    if let Some(start_k) = options.start_k {
        params.start_k = start_k;
    }
    if let Some(adjacent_k) = options.adjacent_k {
        params.adjacent_k = adjacent_k;
    }
    if let Some(max_depth) = options.max_depth {
        params.max_depth = Some(max_depth);
    }
    if let Some(max_traverse) = options.max_traverse {
        params.max_traverse = Some(max_traverse);
    }
    strategy
}
