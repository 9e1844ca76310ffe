pub mod cycle;
pub mod engine;
pub mod graph;
pub mod relaxer;
pub mod state;
pub mod traits;

pub use cycle::CycleExtractor;
pub use engine::Engine;
pub use graph::RateGraph;
pub use relaxer::IncrementalRelaxer;
pub use state::PathState;
