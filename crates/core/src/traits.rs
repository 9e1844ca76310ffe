use super::graph::RateGraph;
use super::state::PathState;
use common::types::AssetId;

/// Trait for relaxers that search the graph for a negative cycle incrementally.
///
/// Implementors are stateless; everything that must survive between calls lives in the
/// `PathState` owned by the caller.
pub trait NegativeCycleDetector {
    /// Marks `vertex` as needing re-examination on the next relaxation pass.
    fn mark_dirty(&self, state: &mut PathState, vertex: AssetId) {
        state.push_dirty(vertex);
    }

    /// Drains the dirty queue.
    ///
    /// Returns `Some(v)` as soon as `v` has been improved `num_vertices` times, proving a
    /// negative cycle on or upstream of `v`, or `None` once the queue is empty.
    fn relax_until_cycle_or_drained(
        &self,
        graph: &RateGraph,
        state: &mut PathState,
    ) -> Option<AssetId>;
}
