use std::collections::VecDeque;

use common::types::AssetId;

/// Shortest-path state relative to the reference vertex, kept alive across every tick and
/// every query.
///
/// - `distance[v]`: best known cumulative weight from the reference vertex.
/// - `predecessor[v]`: last vertex that improved `distance[v]`.
/// - `update_count[v]`: number of times `distance[v]` has been improved.
/// - `dirty`: FIFO multiset of vertices waiting to be relaxed from.
///
/// Nothing here is ever reset. Stale distances are superseded by later relaxations.
#[derive(Debug, Clone)]
pub struct PathState {
    pub(crate) distance: Vec<f64>,
    pub(crate) predecessor: Vec<Option<AssetId>>,
    pub(crate) update_count: Vec<usize>,
    pub(crate) dirty: VecDeque<AssetId>,
}

impl PathState {
    /// Shortest paths are always measured from the first asset in sorted order.
    pub const REFERENCE_VERTEX: AssetId = 0;

    pub fn new(num_vertices: usize) -> Self {
        let mut distance = vec![f64::INFINITY; num_vertices];
        if let Some(reference) = distance.get_mut(Self::REFERENCE_VERTEX) {
            *reference = 0.0;
        }

        Self {
            distance,
            predecessor: vec![None; num_vertices],
            update_count: vec![0; num_vertices],
            dirty: VecDeque::with_capacity(num_vertices),
        }
    }

    /// Queues `vertex` for relaxation. Duplicates are allowed.
    pub fn push_dirty(&mut self, vertex: AssetId) {
        self.dirty.push_back(vertex);
    }

    pub fn num_vertices(&self) -> usize {
        self.distance.len()
    }

    pub fn distance(&self) -> &[f64] {
        &self.distance
    }

    pub fn predecessor(&self) -> &[Option<AssetId>] {
        &self.predecessor
    }

    pub fn update_count(&self) -> &[usize] {
        &self.update_count
    }

    /// Number of queued (possibly duplicate) dirty entries.
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }
}
