//! Pure price-history arithmetic.
//!
//! Both the drop decision and the merged record are computed here from the
//! record as it was *before* this refresh. The store only ever receives the
//! finished record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{DropDecision, PriceSnapshot, TrackedProduct};

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub record: TrackedProduct,
    pub decision: DropDecision,
}

/// Record written when a listing is added. History starts at the snapshot:
/// all three price columns equal the current price and the used column takes
/// the scraped used price verbatim.
pub fn first_write(url: &str, snapshot: &PriceSnapshot, now: DateTime<Utc>) -> TrackedProduct {
    TrackedProduct {
        url: url.to_string(),
        title: snapshot.title.clone(),
        current_price: snapshot.current_price,
        lowest_price: snapshot.current_price,
        highest_price: snapshot.current_price,
        alt_price: snapshot.alt_price,
        last_updated: now,
    }
}

/// Compare fresh prices against the stored low. Both checks use the same
/// pre-refresh `lowest_price`.
pub fn decide_drop(prior: &TrackedProduct, snapshot: &PriceSnapshot) -> DropDecision {
    DropDecision {
        is_lower_price: snapshot.current_price < prior.lowest_price,
        is_lower_alt: snapshot.alt_price > Decimal::ZERO && snapshot.alt_price < prior.lowest_price,
    }
}

/// Fold a snapshot into the stored history.
///
/// The used column is compared against the new *current* price, not the
/// scraped used price; `snapshot.alt_price` only feeds the drop decision.
/// Without a prior record this is [`first_write`] and never a drop. With one,
/// `url` must be the prior's key.
pub fn merge(
    prior: Option<&TrackedProduct>,
    url: &str,
    snapshot: &PriceSnapshot,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let Some(prior) = prior else {
        return MergeOutcome {
            record: first_write(url, snapshot, now),
            decision: DropDecision::default(),
        };
    };

    debug_assert_eq!(prior.url, url, "merge called with a snapshot for a different listing");

    let decision = decide_drop(prior, snapshot);
    let current = snapshot.current_price;

    let record = TrackedProduct {
        url: prior.url.clone(),
        title: snapshot.title.clone(),
        current_price: current,
        lowest_price: prior.lowest_price.min(current),
        highest_price: prior.highest_price.max(current),
        alt_price: if current < prior.alt_price { current } else { prior.alt_price },
        last_updated: now,
    };

    MergeOutcome { record, decision }
}
