use crate::types::NormalizedProduct;

/// Absolute and relative price change for one normalized product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    /// Positive when the price dropped.
    pub change: f64,
    pub percentage: f64,
}

pub fn derive_price_change(product: &NormalizedProduct) -> PriceChange {
    let change = product.previous_price - product.current_price;
    let percentage = if product.previous_price > 0.0 {
        change / product.previous_price * 100.0
    } else {
        0.0
    };
    PriceChange { change, percentage }
}
