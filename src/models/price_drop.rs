use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::PriceSnapshot;

/// Outcome of comparing a fresh snapshot against the stored lowest price.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DropDecision {
    pub is_lower_price: bool,
    pub is_lower_alt: bool,
}

impl DropDecision {
    pub fn should_notify(&self) -> bool {
        self.is_lower_price || self.is_lower_alt
    }
}

/// Everything a notifier needs to tell the user about a drop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceDropAlert {
    pub url: String,
    pub title: String,
    pub current_price: Decimal,
    pub alt_price: Decimal,
    pub is_lower_price: bool,
    pub is_lower_alt: bool,
}

impl PriceDropAlert {
    pub fn new(url: &str, snapshot: &PriceSnapshot, decision: DropDecision) -> Self {
        Self {
            url: url.to_string(),
            title: snapshot.title.clone(),
            current_price: snapshot.current_price,
            alt_price: snapshot.alt_price,
            is_lower_price: decision.is_lower_price,
            is_lower_alt: decision.is_lower_alt,
        }
    }

    pub fn headline(&self) -> &'static str {
        "Price Drop Alert"
    }

    pub fn message(&self, currency_symbol: &str) -> String {
        let mut text = format!("{} has a new lower price!", self.title);

        if self.is_lower_price {
            text.push_str(&format!("\nNew Price: {}", format_price(self.current_price, currency_symbol)));
        }
        if self.is_lower_alt {
            text.push_str(&format!("\nNew Used Price: {}", format_price(self.alt_price, currency_symbol)));
        }

        text
    }
}

/// Render an amount as `$12,999.00`: symbol, thousands grouping, two decimals.
pub fn format_price(amount: Decimal, currency_symbol: &str) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());

    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}{}.{}", if negative { "-" } else { "" }, currency_symbol, grouped, fraction)
}
