use super::graph::RateGraph;
use super::state::PathState;
use super::traits::NegativeCycleDetector;
use common::types::AssetId;
use common::weights::DEFAULT_TOLERANCE;

/// Queue-based (SPFA) Bellman–Ford relaxation restricted to the dirty frontier.
///
/// Only vertices whose estimate may have changed are re-examined, so the work done after a
/// tick is proportional to the region it affects rather than to the whole graph. Path state
/// is never reset, which keeps every call incremental.
///
/// A vertex improved `num_vertices` times is a negative-cycle witness: without a negative
/// cycle a shortest path visits at most `num_vertices - 1` other vertices.
///
/// A relaxation only counts when it beats the current distance by more than `tolerance`.
/// This absorbs rounding noise in exactly consistent markets, at the price of never
/// reporting a loop whose total weight lies within a few multiples of `tolerance` below
/// zero.
///
/// Every edge that may still be relaxable has its source in the dirty queue. Returning on a
/// witness puts the vertex being scanned back at the front, so its remaining edges are
/// examined by the next call.
#[derive(Debug, Clone, Copy)]
pub struct IncrementalRelaxer {
    tolerance: f64,
}

impl IncrementalRelaxer {
    /// `tolerance` is the minimum improvement that counts as a relaxation.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for IncrementalRelaxer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl NegativeCycleDetector for IncrementalRelaxer {
    fn relax_until_cycle_or_drained(
        &self,
        graph: &RateGraph,
        state: &mut PathState,
    ) -> Option<AssetId> {
        let num_vertices = graph.num_vertices();
        debug_assert_eq!(num_vertices, state.num_vertices());

        while let Some(u) = state.dirty.pop_front() {
            // Ids outside the graph carry no edges.
            if u >= num_vertices || u >= state.num_vertices() {
                continue;
            }

            // Vertices not yet reachable from the reference have nothing to offer.
            if !state.distance[u].is_finite() {
                continue;
            }

            for edge in graph.edges(u) {
                let v = edge.destination;
                let candidate = state.distance[u] + edge.weight;

                if candidate < state.distance[v] - self.tolerance {
                    state.distance[v] = candidate;
                    state.predecessor[v] = Some(u);
                    state.dirty.push_back(v);

                    state.update_count[v] += 1;
                    if state.update_count[v] >= num_vertices {
                        state.dirty.push_front(u);
                        return Some(v);
                    }
                }
            }
        }

        None
    }
}
