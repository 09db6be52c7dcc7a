use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A listing being watched, keyed by its URL.
///
/// `lowest_price` and `highest_price` are watermarks over every `current_price`
/// seen by refreshes. `alt_price` is the "used" column: it is seeded with the
/// scraped used price when the listing is added and afterwards only moves when
/// a refresh sees a *current* price below it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedProduct {
    pub url: String,
    pub title: String,
    pub current_price: Decimal,
    pub lowest_price: Decimal,
    pub highest_price: Decimal,
    pub alt_price: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl TrackedProduct {
    pub fn within_watermarks(&self) -> bool {
        self.lowest_price <= self.current_price && self.current_price <= self.highest_price
    }

    /// Whether a used offer is known for this listing.
    pub fn has_alt_price(&self) -> bool {
        self.alt_price > Decimal::ZERO
    }
}
