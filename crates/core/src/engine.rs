use tracing::{debug, warn};

use super::cycle::CycleExtractor;
use super::graph::RateGraph;
use super::relaxer::IncrementalRelaxer;
use super::state::PathState;
use super::traits::NegativeCycleDetector;
use common::error::Error;
use common::types::ArbitrageCycle;
use common::weights::DEFAULT_TOLERANCE;

/// Incremental arbitrage engine: one rate graph, its persistent path state and the
/// detector that relaxes it.
///
/// The engine is single-threaded by design. All ticks and queries must come from one owner;
/// share it across threads only behind external serialization.
#[derive(Debug)]
pub struct Engine<D = IncrementalRelaxer> {
    graph: RateGraph,
    state: PathState,
    detector: D,
    extractor: CycleExtractor,
    tolerance: f64,
}

impl Engine<IncrementalRelaxer> {
    /// Builds an engine over the assets found in `symbols` (`BASE-QUOTE` pairs).
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self, Error> {
        Self::with_tolerance(symbols, DEFAULT_TOLERANCE)
    }

    /// Same as [`Engine::new`] with an explicit epsilon gate for relaxation and
    /// profitability.
    pub fn with_tolerance<S: AsRef<str>>(symbols: &[S], tolerance: f64) -> Result<Self, Error> {
        let detector = IncrementalRelaxer::new(tolerance);
        let mut engine = Self::with_detector(symbols, detector)?;
        engine.tolerance = detector.tolerance();
        Ok(engine)
    }
}

impl<D> Engine<D>
where
    D: NegativeCycleDetector,
{
    pub fn with_detector<S: AsRef<str>>(symbols: &[S], detector: D) -> Result<Self, Error> {
        let graph = RateGraph::new(symbols)?;
        let state = PathState::new(graph.num_vertices());

        Ok(Self {
            graph,
            state,
            detector,
            extractor: CycleExtractor,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Applies a price tick and marks both endpoints dirty.
    ///
    /// Nothing is mutated on error. Non-fatal errors (unknown asset, invalid price) are
    /// logged here; the caller decides whether to stop with [`Error::is_fatal`].
    pub fn apply_tick(&mut self, symbol: &str, price: f64) -> Result<(), Error> {
        match self.graph.apply_tick(symbol, price) {
            Ok((base, quote)) => {
                self.detector.mark_dirty(&mut self.state, base);
                self.detector.mark_dirty(&mut self.state, quote);
                Ok(())
            }
            Err(e) => {
                if !e.is_fatal() {
                    warn!(symbol, price, error = %e, "Dropping tick");
                }
                Err(e)
            }
        }
    }

    /// Drains pending relaxations and returns a profitable cycle if one is proven.
    ///
    /// `Ok(None)` is the normal "no opportunity" answer. A witness whose reconstructed loop
    /// does not compound above 1.0 under the current weights is discarded and relaxation
    /// resumes, so a returned cycle is always profitable at the latest prices.
    pub fn find_opportunity(&mut self) -> Result<Option<ArbitrageCycle>, Error> {
        while let Some(witness) = self
            .detector
            .relax_until_cycle_or_drained(&self.graph, &mut self.state)
        {
            match self.extractor.reconstruct(&self.graph, &self.state, witness) {
                Ok(cycle) if cycle.log_rate_sum < -self.tolerance => return Ok(Some(cycle)),
                Ok(cycle) => {
                    debug!(
                        witness,
                        log_rate_sum = cycle.log_rate_sum,
                        "Discarding stale cycle witness"
                    );
                }
                Err(Error::CycleReconstructionFailed) => {
                    debug!(witness, "Witness has no closed predecessor chain");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    pub fn graph(&self) -> &RateGraph {
        &self.graph
    }

    pub fn path_state(&self) -> &PathState {
        &self.state
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    pub fn assets(&self) -> &[String] {
        self.graph.assets()
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;

    fn assert_is_rotation(cycle: &[String], expected: &[&str]) {
        assert_eq!(cycle.len(), expected.len(), "cycle {:?}", cycle);
        let offset = expected
            .iter()
            .position(|a| *a == cycle[0])
            .unwrap_or_else(|| panic!("{} not in {:?}", cycle[0], expected));
        for (i, asset) in cycle.iter().enumerate() {
            assert_eq!(asset, expected[(offset + i) % expected.len()]);
        }
    }

    fn assert_edges_exist(engine: &Engine, cycle: &ArbitrageCycle) {
        let len = cycle.vertices.len();
        for i in 0..len {
            let from = cycle.vertices[i];
            let to = cycle.vertices[(i + 1) % len];
            assert!(engine.graph().has_edge(from, to), "missing edge {from}->{to}");
        }
    }

    #[test]
    fn detects_triangular_arbitrage() {
        let mut engine = Engine::new(&["A-B", "B-C", "C-A"]).unwrap();
        engine.apply_tick("A-B", 2.0).unwrap();
        engine.apply_tick("B-C", 3.0).unwrap();
        engine.apply_tick("C-A", 0.2).unwrap();

        let cycle = engine
            .find_opportunity()
            .unwrap()
            .expect("A -> B -> C -> A compounds to 1.2");

        assert_is_rotation(&cycle.assets, &["A", "B", "C"]);
        assert_edges_exist(&engine, &cycle);
        assert!((cycle.product_rate() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn consistent_prices_yield_no_opportunity() {
        let mut engine = Engine::new(&["A-B", "B-C", "A-C"]).unwrap();
        engine.apply_tick("A-B", 2.0).unwrap();
        engine.apply_tick("B-C", 3.0).unwrap();
        engine.apply_tick("A-C", 6.0).unwrap();

        assert_eq!(engine.find_opportunity().unwrap(), None);
    }

    #[test]
    fn no_opportunity_before_any_tick() {
        let mut engine = Engine::new(&["BTC-USD", "ETH-USD", "ETH-BTC"]).unwrap();
        assert_eq!(engine.find_opportunity().unwrap(), None);
    }

    #[test]
    fn repeated_identical_tick_never_detects() {
        let mut engine = Engine::new(&["BTC-USD", "ETH-USD", "ETH-BTC"]).unwrap();

        for _ in 0..50 {
            engine.apply_tick("BTC-USD", 50_000.0).unwrap();
            assert_eq!(engine.find_opportunity().unwrap(), None);
        }

        let weight = engine.graph().edge_weight(0, 2).unwrap();
        assert_eq!(weight, -(50_000.0f64).ln());
    }

    #[test]
    fn unknown_asset_is_soft_and_leaves_state_unchanged() {
        let mut engine = Engine::new(&["BTC-USD", "ETH-USD"]).unwrap();
        engine.apply_tick("BTC-USD", 2.0).unwrap();
        engine.find_opportunity().unwrap();

        let before = engine.path_state().clone();
        let result = engine.apply_tick("DOGE-USD", 0.1);

        let err = result.unwrap_err();
        assert_eq!(err, Error::UnknownAsset("DOGE".to_string()));
        assert!(!err.is_fatal());
        assert_eq!(engine.num_vertices(), 3);
        assert_eq!(engine.path_state().distance(), before.distance());
        assert_eq!(engine.path_state().predecessor(), before.predecessor());
        assert_eq!(engine.path_state().update_count(), before.update_count());
        assert_eq!(engine.path_state().dirty_len(), before.dirty_len());
    }

    #[test]
    fn malformed_symbol_is_fatal_and_leaves_state_unchanged() {
        let mut engine = Engine::new(&["BTC-USD", "ETH-USD"]).unwrap();

        let err = engine.apply_tick("BTCUSD", 2.0).unwrap_err();

        assert_eq!(err, Error::MalformedSymbol("BTCUSD".to_string()));
        assert!(err.is_fatal());
        assert_eq!(engine.graph().num_edges(), 0);
        assert_eq!(engine.path_state().dirty_len(), 0);
    }

    #[test]
    fn malformed_construction_input_is_rejected() {
        let result = Engine::new(&["BTC-USD", "ETHUSD"]);
        assert!(matches!(result, Err(Error::MalformedSymbol(s)) if s == "ETHUSD"));
    }

    #[test]
    fn disconnected_cycle_waits_for_connectivity() {
        // A is the reference vertex; the profitable loop C -> D -> E -> C is priced first.
        let mut engine = Engine::new(&["A-C", "C-D", "D-E", "E-C"]).unwrap();
        engine.apply_tick("C-D", 2.0).unwrap();
        engine.apply_tick("D-E", 3.0).unwrap();
        engine.apply_tick("E-C", 0.2).unwrap();

        // Unreachable from A, so it is not detected yet.
        assert_eq!(engine.find_opportunity().unwrap(), None);
        assert!(engine.path_state().distance()[1..].iter().all(|d| d.is_infinite()));

        engine.apply_tick("A-C", 1.0).unwrap();
        let cycle = engine
            .find_opportunity()
            .unwrap()
            .expect("loop becomes reachable once A-C is priced");

        assert_is_rotation(&cycle.assets, &["C", "D", "E"]);
        assert_edges_exist(&engine, &cycle);
    }

    #[test]
    fn reverse_direction_cycle_is_found() {
        // Same triangle priced so that the loop only pays going A -> C -> B -> A.
        let mut engine = Engine::new(&["A-B", "B-C", "C-A"]).unwrap();
        engine.apply_tick("A-B", 2.0).unwrap();
        engine.apply_tick("B-C", 2.0).unwrap();
        engine.apply_tick("C-A", 0.2).unwrap();

        let cycle = engine.find_opportunity().unwrap().unwrap();
        assert_is_rotation(&cycle.assets, &["A", "C", "B"]);
        assert!((cycle.product_rate() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn repriced_to_consistent_yields_no_opportunity() {
        let mut engine = Engine::new(&["A-B", "B-C", "C-A"]).unwrap();
        engine.apply_tick("A-B", 2.0).unwrap();
        engine.apply_tick("B-C", 3.0).unwrap();
        engine.apply_tick("C-A", 0.2).unwrap();
        assert!(engine.find_opportunity().unwrap().is_some());

        // 2 * 3 * (1/6) compounds to exactly 1.0.
        engine.apply_tick("C-A", 1.0 / 6.0).unwrap();
        assert_eq!(engine.find_opportunity().unwrap(), None);

        // The same loop pays again once C-A moves back.
        engine.apply_tick("C-A", 0.2).unwrap();
        let cycle = engine.find_opportunity().unwrap().unwrap();
        assert_is_rotation(&cycle.assets, &["A", "B", "C"]);
    }

    #[test]
    fn new_loop_found_after_stale_witnesses() {
        let mut engine =
            Engine::new(&["A-B", "B-C", "C-A", "A-D", "B-D", "C-D"]).unwrap();
        engine.apply_tick("C-D", 2.0).unwrap();
        engine.apply_tick("B-D", 1.0).unwrap();
        engine.apply_tick("A-D", 4.0).unwrap();
        assert_eq!(engine.find_opportunity().unwrap(), None);

        engine.apply_tick("A-B", 2.0).unwrap();
        let first = engine.find_opportunity().unwrap().unwrap();
        assert_is_rotation(&first.assets, &["A", "D", "B"]);
        assert!(
            engine
                .path_state()
                .update_count()
                .iter()
                .any(|&count| count >= engine.num_vertices())
        );

        // A -> D -> B -> A no longer pays, B -> D -> A -> B does. The old loop's witnesses
        // are discarded on the way to the new one.
        engine.apply_tick("A-D", 1.0).unwrap();
        let second = engine
            .find_opportunity()
            .unwrap()
            .expect("B -> D -> A -> B compounds to 2.0");

        assert_is_rotation(&second.assets, &["B", "D", "A"]);
        assert_edges_exist(&engine, &second);
        assert!((second.product_rate() - 2.0).abs() < 1e-9);
    }

    fn assert_no_relaxable_edge(engine: &Engine) {
        let distance = engine.path_state().distance();
        for u in 0..engine.num_vertices() {
            if !distance[u].is_finite() {
                continue;
            }
            for edge in engine.graph().edges(u) {
                assert!(
                    distance[u] + edge.weight >= distance[edge.destination] - DEFAULT_TOLERANCE,
                    "edge {u}->{} still relaxable",
                    edge.destination
                );
            }
        }
    }

    #[test]
    fn drained_state_leaves_no_relaxable_edge() {
        let mut engine =
            Engine::new(&["A-B", "B-C", "C-A", "A-D", "B-D", "C-D"]).unwrap();
        let ticks = [
            ("C-D", 2.0),
            ("B-D", 1.0),
            ("A-D", 4.0),
            ("A-B", 2.0),
            ("A-D", 1.0),
            // Values A=4, B=2, C=1, D=1 from here on.
            ("B-C", 2.0),
            ("C-A", 0.25),
            ("A-D", 4.0),
            ("B-D", 2.0),
            ("C-D", 1.0),
        ];

        let mut found = None;
        for (symbol, price) in ticks {
            engine.apply_tick(symbol, price).unwrap();
            found = engine.find_opportunity().unwrap();
            if found.is_none() {
                assert_no_relaxable_edge(&engine);
            }
        }

        // The final prices are consistent.
        assert_eq!(found, None);
    }

    #[test]
    fn opportunity_length_is_bounded_by_vertex_count() {
        let mut engine = Engine::new(&["A-B", "B-C", "C-D", "D-A", "A-C"]).unwrap();
        engine.apply_tick("A-B", 1.1).unwrap();
        engine.apply_tick("B-C", 1.1).unwrap();
        engine.apply_tick("C-D", 1.1).unwrap();
        engine.apply_tick("D-A", 1.1).unwrap();

        let cycle = engine.find_opportunity().unwrap().unwrap();
        assert!(!cycle.is_empty());
        assert!(cycle.len() <= engine.num_vertices());
        assert_edges_exist(&engine, &cycle);
    }
}
