use super::graph::RateGraph;
use super::state::PathState;
use common::error::Error;
use common::types::{AssetId, ArbitrageCycle};
use common::weights::weight_to_rate;

/// Recovers the loop of trades behind a negative-cycle witness.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleExtractor;

impl CycleExtractor {
    /// Reconstructs the negative cycle on or upstream of `witness`.
    ///
    /// The witness may sit downstream of the cycle. Walking `predecessor` exactly
    /// `num_vertices` times is guaranteed to land inside it, since no cycle is longer than
    /// the vertex count. From that vertex the walk continues until it comes back, and the
    /// visited vertices are emitted in trading order.
    ///
    /// Each leg is then checked against the current adjacency and priced, so the returned
    /// cycle always consists of existing edges.
    ///
    /// # Errors
    /// - `Error::NodeIndexOutOfBounds` if `witness` is not a vertex.
    /// - `Error::CycleReconstructionFailed` if the predecessor chain is broken, does not
    ///   close within `num_vertices` steps, or uses an edge that does not exist.
    pub fn reconstruct(
        &self,
        graph: &RateGraph,
        state: &PathState,
        witness: AssetId,
    ) -> Result<ArbitrageCycle, Error> {
        let num_vertices = graph.num_vertices();
        if witness >= num_vertices || witness >= state.num_vertices() {
            return Err(Error::NodeIndexOutOfBounds(witness));
        }

        let predecessor = state.predecessor();
        let step = |v: AssetId| predecessor[v].ok_or(Error::CycleReconstructionFailed);

        let mut cycle_start = witness;
        for _ in 0..num_vertices {
            cycle_start = step(cycle_start)?;
        }

        let mut vertices: Vec<AssetId> = Vec::new();
        let mut current = step(cycle_start)?;
        while current != cycle_start {
            vertices.push(current);
            if vertices.len() >= num_vertices {
                return Err(Error::CycleReconstructionFailed);
            }
            current = step(current)?;
        }
        vertices.push(cycle_start);

        // Collected walking backwards.
        vertices.reverse();

        self.price_cycle(graph, vertices)
    }

    fn price_cycle(
        &self,
        graph: &RateGraph,
        vertices: Vec<AssetId>,
    ) -> Result<ArbitrageCycle, Error> {
        let len = vertices.len();
        let mut assets = Vec::with_capacity(len);
        let mut rates = Vec::with_capacity(len);
        let mut log_rate_sum = 0.0f64;

        for (i, &from) in vertices.iter().enumerate() {
            let to = vertices[(i + 1) % len];
            let weight = graph
                .edge_weight(from, to)
                .ok_or(Error::CycleReconstructionFailed)?;
            let symbol = graph
                .asset_symbol(from)
                .ok_or(Error::NodeIndexOutOfBounds(from))?;

            assets.push(symbol.to_string());
            rates.push(weight_to_rate(weight));
            log_rate_sum += weight;
        }

        Ok(ArbitrageCycle {
            assets,
            vertices,
            rates,
            log_rate_sum,
        })
    }
}

#[cfg(test)]
mod cycle_tests {
    use super::*;

    fn triangle_graph() -> RateGraph {
        let mut graph = RateGraph::new(&["A-B", "B-C", "C-A"]).unwrap();
        graph.apply_tick("A-B", 2.0).unwrap();
        graph.apply_tick("B-C", 3.0).unwrap();
        graph.apply_tick("C-A", 0.2).unwrap();
        graph
    }

    fn state_with_predecessors(predecessor: Vec<Option<AssetId>>) -> PathState {
        let mut state = PathState::new(predecessor.len());
        state.predecessor = predecessor;
        state
    }

    #[test]
    fn reconstructs_triangle_in_trading_order() {
        let graph = triangle_graph();
        // A <- C, B <- A, C <- B
        let state = state_with_predecessors(vec![Some(2), Some(0), Some(1)]);

        let cycle = CycleExtractor.reconstruct(&graph, &state, 2).unwrap();

        assert_eq!(cycle.vertices, vec![2, 0, 1]);
        assert_eq!(cycle.assets, vec!["C", "A", "B"]);
        assert!((cycle.product_rate() - 1.2).abs() < 1e-9);
        assert!(cycle.is_profitable());
        assert_eq!(cycle.rates.len(), 3);
    }

    #[test]
    fn witness_downstream_of_cycle_lands_inside_it() {
        let mut graph = RateGraph::new(&["A-B", "A-D", "B-C", "C-A"]).unwrap();
        graph.apply_tick("A-B", 2.0).unwrap();
        graph.apply_tick("B-C", 3.0).unwrap();
        graph.apply_tick("C-A", 0.2).unwrap();
        graph.apply_tick("A-D", 1.0).unwrap();

        // D hangs off the A-B-C loop.
        let state = state_with_predecessors(vec![Some(2), Some(0), Some(1), Some(0)]);
        let cycle = CycleExtractor.reconstruct(&graph, &state, 3).unwrap();

        assert_eq!(cycle.len(), 3);
        assert!(!cycle.vertices.contains(&3));
        assert!(cycle.is_profitable());
    }

    #[test]
    fn reconstructs_self_loop() {
        let mut graph = RateGraph::new(&["A-B", "B-B"]).unwrap();
        graph.apply_tick("B-B", 0.5).unwrap();

        let state = state_with_predecessors(vec![None, Some(1)]);
        let cycle = CycleExtractor.reconstruct(&graph, &state, 1).unwrap();

        assert_eq!(cycle.vertices, vec![1]);
        assert_eq!(cycle.assets, vec!["B"]);
        assert_eq!(cycle.log_rate_sum, (0.5f64).ln());
    }

    #[test]
    fn cycle_avoiding_reference_vertex() {
        let mut graph = RateGraph::new(&["A-B", "B-C"]).unwrap();
        graph.apply_tick("A-B", 1.0).unwrap();
        graph.apply_tick("B-C", 2.0).unwrap();

        // B <- C, C <- B: a 2-cycle that does not include vertex 0.
        let state = state_with_predecessors(vec![None, Some(2), Some(1)]);
        let cycle = CycleExtractor.reconstruct(&graph, &state, 1).unwrap();

        assert_eq!(cycle.len(), 2);
        assert!(cycle.vertices.contains(&1) && cycle.vertices.contains(&2));
        // B -> C -> B compounds to exactly 1.0.
        assert!(cycle.log_rate_sum.abs() < 1e-12);
    }

    #[test]
    fn broken_predecessor_chain_fails() {
        let graph = triangle_graph();
        let state = state_with_predecessors(vec![None, Some(0), Some(1)]);

        let result = CycleExtractor.reconstruct(&graph, &state, 2);
        assert_eq!(result.unwrap_err(), Error::CycleReconstructionFailed);
    }

    #[test]
    fn missing_edge_fails() {
        let mut graph = RateGraph::new(&["A-B", "B-C", "C-A"]).unwrap();
        graph.apply_tick("A-B", 2.0).unwrap();

        let state = state_with_predecessors(vec![Some(2), Some(0), Some(1)]);
        let result = CycleExtractor.reconstruct(&graph, &state, 0);
        assert_eq!(result.unwrap_err(), Error::CycleReconstructionFailed);
    }

    #[test]
    fn out_of_bounds_witness_fails() {
        let graph = triangle_graph();
        let state = PathState::new(3);

        let result = CycleExtractor.reconstruct(&graph, &state, 7);
        assert_eq!(result.unwrap_err(), Error::NodeIndexOutOfBounds(7));
    }
}
