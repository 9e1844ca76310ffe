use super::types::AssetId;

/// Separator between the base and quote asset of a trading pair.
pub const PAIR_SEPARATOR: char = '-';

/// Default epsilon gate for relaxation and profitability checks.
///
/// Improvements smaller than this are treated as floating-point noise, so a market whose
/// cycles compound to exactly 1.0 never produces a witness.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Transforms an exchange rate into an edge weight: `w = -ln(rate)`.
///
/// A cycle whose rates multiply to more than 1.0 has a negative weight sum.
pub fn rate_to_weight(rate: f64) -> f64 {
    -rate.ln()
}

/// Inverse of [`rate_to_weight`].
pub fn weight_to_rate(weight: f64) -> f64 {
    (-weight).exp()
}

/// Forward (base -> quote) and reverse (quote -> base) weights for a last-traded price.
///
/// The reverse weight is `-ln(1 / price)`. It is evaluated as `ln(price)`, which is the same
/// quantity and keeps `reverse == -forward` bit-exact, so a lone pair is a zero cycle.
pub fn tick_weights(price: f64) -> (f64, f64) {
    let forward = rate_to_weight(price);
    let reverse = -forward;
    (forward, reverse)
}

/// Returns true when `-ln(price)` is a finite weight.
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Injective key for an ordered (source, destination) pair: `source << 32 | destination`.
///
/// Both ids must fit in 32 bits, which the graph guarantees at construction.
pub fn edge_key(source: AssetId, destination: AssetId) -> u64 {
    ((source as u64) << 32) | (destination as u64 & 0xFFFF_FFFF)
}

/// Splits `BASE-QUOTE` into its two tokens.
///
/// Returns `None` when the separator is missing, repeated, or either side is empty.
pub fn split_pair(symbol: &str) -> Option<(&str, &str)> {
    let (base, quote) = symbol.split_once(PAIR_SEPARATOR)?;
    if base.is_empty() || quote.is_empty() || quote.contains(PAIR_SEPARATOR) {
        return None;
    }
    Some((base, quote))
}
