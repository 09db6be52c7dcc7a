use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a single fetch of a listing page yielded. Never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSnapshot {
    pub title: String,
    pub current_price: Decimal,
    /// Used offer price, zero when the page shows none.
    pub alt_price: Decimal,
}

impl PriceSnapshot {
    pub fn new(title: impl Into<String>, current_price: Decimal, alt_price: Decimal) -> Self {
        Self {
            title: title.into(),
            current_price,
            alt_price,
        }
    }
}
