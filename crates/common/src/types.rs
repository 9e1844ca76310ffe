/// Dense vertex id, used directly as an index into per-vertex arrays.
pub type AssetId = usize;

/// A single price observation for a `BASE-QUOTE` pair.
///
/// `price` is the number of QUOTE units paid for one BASE unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Tick {
            symbol: symbol.into(),
            price,
        }
    }
}

/// Outgoing edge stored in the adjacency list of its source vertex.
///
/// `weight` is `-ln(rate)` where `rate` is units of destination per unit of source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectedEdge {
    pub destination: AssetId,
    pub weight: f64,
}

/// A profitable loop of trades recovered from the predecessor chain.
///
/// Fields:
/// - `assets`: symbols in trading order. The last asset trades back into the first.
/// - `vertices`: the same loop as dense vertex ids.
/// - `rates`: rate of each leg, `rates[i]` trades `assets[i]` into `assets[(i + 1) % len]`.
/// - `log_rate_sum`: sum of transformed weights (`-ln(rate)`); negative means profit.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageCycle {
    pub assets: Vec<String>,
    pub vertices: Vec<AssetId>,
    pub rates: Vec<f64>,
    pub log_rate_sum: f64,
}

impl ArbitrageCycle {
    /// Returns the compounded rate (∏ rate_i) of one trip around the cycle.
    ///
    /// Recovered from the stored transformed sum: rate_product = e^(-sum(w_i)).
    ///
    /// Example:
    /// ```text
    /// rates [2.0, 3.0, 0.2] (∏=1.2)
    /// log_rate_sum = -ln(1.2) ≈ -0.182
    /// product_rate = exp(0.182) = 1.2
    /// ```
    pub fn product_rate(&self) -> f64 {
        (-self.log_rate_sum).exp()
    }

    /// Returns true if the cycle is profitable (product_rate > 1.0).
    pub fn is_profitable(&self) -> bool {
        self.log_rate_sum < 0.0
    }

    /// Number of legs (and distinct assets) in the loop.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Human readable route, e.g. `BTC -> ETH -> USD -> BTC`.
    pub fn route(&self) -> String {
        let mut route = self.assets.join(" -> ");
        if let Some(first) = self.assets.first() {
            route.push_str(" -> ");
            route.push_str(first);
        }
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> ArbitrageCycle {
        let rates = vec![2.0, 3.0, 0.2];
        let log_rate_sum = rates.iter().map(|r: &f64| -r.ln()).sum();
        ArbitrageCycle {
            assets: vec!["A".into(), "B".into(), "C".into()],
            vertices: vec![0, 1, 2],
            rates,
            log_rate_sum,
        }
    }

    #[test]
    fn product_rate_recovers_compounded_rate() {
        let cycle = triangle();
        assert!((cycle.product_rate() - 1.2).abs() < 1e-12);
        assert!(cycle.is_profitable());
    }

    #[test]
    fn route_wraps_back_to_start() {
        assert_eq!(triangle().route(), "A -> B -> C -> A");
    }

    #[test]
    fn break_even_cycle_is_not_profitable() {
        let mut cycle = triangle();
        cycle.log_rate_sum = 0.0;
        assert!(!cycle.is_profitable());
        assert_eq!(cycle.product_rate(), 1.0);
    }
}
