use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;

use crate::config::{ScraperConfig, SelectorConfig};
use crate::models::PriceSnapshot;
use crate::utils::error::{AppError, ExtractionError};

/// Turns a listing URL into a price snapshot.
///
/// The pipeline only depends on this trait, so a storefront with different
/// markup gets its own implementation without touching aggregation or
/// scheduling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<PriceSnapshot, ExtractionError>;
}

/// Strip every `.` and `,` from a displayed price and parse what is left.
///
/// Grouping and decimal separators are not told apart, so `"129.99"` becomes
/// `12999` and `"1,299.99"` becomes `129999`. Stored watermarks depend on this
/// exact behaviour; changing it would make old and new prices incomparable.
pub fn normalize_price(text: &str) -> Result<Decimal, ExtractionError> {
    let digits: String = text.chars().filter(|c| *c != '.' && *c != ',').collect();
    let digits = digits.trim();

    Decimal::from_str(digits).map_err(|_| ExtractionError::PriceParseError {
        text: text.trim().to_string(),
    })
}

/// Selector-driven parser for a listing page.
#[derive(Debug, Clone)]
pub struct ListingParser {
    title: Selector,
    price: Selector,
    alt_price: Selector,
}

impl ListingParser {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, AppError> {
        Ok(Self {
            title: parse_selector(&selectors.title)?,
            price: parse_selector(&selectors.price)?,
            alt_price: parse_selector(&selectors.alt_price)?,
        })
    }

    pub fn parse(&self, html: &str) -> Result<PriceSnapshot, ExtractionError> {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(element_text)
            .ok_or(ExtractionError::TitleNotFound)?;

        let price_text = document
            .select(&self.price)
            .next()
            .map(element_text)
            .ok_or(ExtractionError::PriceNotFound)?;
        let current_price = normalize_price(&price_text)?;

        // A missing or garbled used offer is normal; treat it as "none".
        let alt_price = document
            .select(&self.alt_price)
            .next()
            .map(element_text)
            .and_then(|text| normalize_price(&text).ok())
            .unwrap_or(Decimal::ZERO);

        Ok(PriceSnapshot {
            title,
            current_price,
            alt_price,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Fetches listing pages over HTTP GET with a browser user agent.
pub struct HttpExtractor {
    client: reqwest::Client,
    parser: ListingParser,
}

impl HttpExtractor {
    pub fn new(config: &ScraperConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            parser: ListingParser::new(&config.selectors)?,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, ExtractionError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PriceExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<PriceSnapshot, ExtractionError> {
        let start_time = std::time::Instant::now();
        let body = self.fetch(url).await?;
        let snapshot = self.parser.parse(&body)?;

        tracing::debug!(
            "Extracted {} from {} in {}ms (used: {})",
            snapshot.current_price,
            url,
            start_time.elapsed().as_millis(),
            snapshot.alt_price
        );
        Ok(snapshot)
    }
}
