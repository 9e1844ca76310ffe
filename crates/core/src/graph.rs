use std::collections::{BTreeSet, HashMap};
use tracing::trace;

use common::error::Error;
use common::types::{AssetId, DirectedEdge};
use common::weights::{edge_key, is_valid_price, split_pair, tick_weights};

/// Exchange-rate graph over a fixed set of assets.
///
/// Layout:
/// - `assets[id]` -> symbol of vertex `id` (sorted, so ids are deterministic)
/// - `asset_ids[symbol]` -> vertex id
/// - `adjacency[u]` -> outgoing edges of `u`, append-only
/// - `edge_index[edge_key(u, v)]` -> position of edge `u -> v` inside `adjacency[u]`
///
/// The vertex set is frozen at construction. Edges appear lazily the first time a tick
/// prices that direction and are then updated in place, so every lookup and every
/// update is O(1).
#[derive(Debug, Clone)]
pub struct RateGraph {
    assets: Vec<String>,
    asset_ids: HashMap<String, AssetId>,
    adjacency: Vec<Vec<DirectedEdge>>,
    edge_index: HashMap<u64, usize>,
}

impl RateGraph {
    /// Builds the static skeleton of the graph from a list of `BASE-QUOTE` pairs.
    ///
    /// Every distinct token becomes a vertex. Ids follow lexicographic order of the
    /// tokens, independent of the order of `symbols`.
    ///
    /// # Errors
    /// - `Error::MalformedSymbol` if any pair lacks a single separator.
    /// - `Error::EmptyGraph` if `symbols` yields no asset.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self, Error> {
        let mut distinct = BTreeSet::new();
        for symbol in symbols {
            let symbol = symbol.as_ref();
            let (base, quote) =
                split_pair(symbol).ok_or_else(|| Error::MalformedSymbol(symbol.to_string()))?;
            distinct.insert(base);
            distinct.insert(quote);
        }

        if distinct.is_empty() {
            return Err(Error::EmptyGraph);
        }

        // Edge keys pack both ids into 32 bits each.
        if distinct.len() > u32::MAX as usize {
            return Err(Error::NodeIndexOutOfBounds(distinct.len()));
        }

        let assets: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
        let asset_ids = assets
            .iter()
            .enumerate()
            .map(|(id, asset)| (asset.clone(), id))
            .collect();
        let num_vertices = assets.len();

        Ok(Self {
            assets,
            asset_ids,
            adjacency: vec![Vec::new(); num_vertices],
            edge_index: HashMap::new(),
        })
    }

    /// Applies a last-traded price for `symbol` and returns `(base_id, quote_id)`.
    ///
    /// Upserts `base -> quote` with `-ln(price)` and `quote -> base` with `-ln(1/price)`.
    /// On any error the graph is left untouched.
    ///
    /// # Errors
    /// - `Error::MalformedSymbol` if the pair has no separator.
    /// - `Error::UnknownAsset` if either side is not a registered vertex.
    /// - `Error::InvalidPrice` if the price is not finite and positive.
    pub fn apply_tick(&mut self, symbol: &str, price: f64) -> Result<(AssetId, AssetId), Error> {
        let (base, quote) =
            split_pair(symbol).ok_or_else(|| Error::MalformedSymbol(symbol.to_string()))?;

        let base_id = self.require_asset(base)?;
        let quote_id = self.require_asset(quote)?;

        if !is_valid_price(price) {
            return Err(Error::InvalidPrice {
                symbol: symbol.to_string(),
                price,
            });
        }

        let (forward_weight, reverse_weight) = tick_weights(price);
        self.upsert_edge(base_id, quote_id, forward_weight);
        self.upsert_edge(quote_id, base_id, reverse_weight);

        Ok((base_id, quote_id))
    }

    fn require_asset(&self, asset: &str) -> Result<AssetId, Error> {
        self.asset_id(asset)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    /// Updates the weight of `source -> destination` in place, or appends it if it does not
    /// exist yet.
    fn upsert_edge(&mut self, source: AssetId, destination: AssetId, weight: f64) {
        let key = edge_key(source, destination);
        let edges = &mut self.adjacency[source];

        match self.edge_index.get(&key).copied() {
            Some(pos) => edges[pos].weight = weight,
            None => {
                edges.push(DirectedEdge {
                    destination,
                    weight,
                });
                self.edge_index.insert(key, edges.len() - 1);
                trace!(source, destination, weight, "Edge inserted");
            }
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.assets.len()
    }

    /// Number of directed edges priced so far.
    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    pub fn asset_id(&self, asset: &str) -> Option<AssetId> {
        self.asset_ids.get(asset).copied()
    }

    pub fn asset_symbol(&self, id: AssetId) -> Option<&str> {
        self.assets.get(id).map(String::as_str)
    }

    /// All asset symbols, indexed by vertex id.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Outgoing edges of `source`, in insertion order. Empty for unknown ids.
    pub fn edges(&self, source: AssetId) -> &[DirectedEdge] {
        self.adjacency
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// O(1) lookup of the current weight of `source -> destination`.
    pub fn edge_weight(&self, source: AssetId, destination: AssetId) -> Option<f64> {
        let pos = *self.edge_index.get(&edge_key(source, destination))?;
        self.adjacency
            .get(source)
            .and_then(|edges| edges.get(pos))
            .map(|edge| edge.weight)
    }

    pub fn has_edge(&self, source: AssetId, destination: AssetId) -> bool {
        self.edge_index.contains_key(&edge_key(source, destination))
    }
}
