use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A retailer whose listings the engine knows how to read.
///
/// The three Australian supermarkets have built-in profiles; any other id is
/// carried verbatim (lowercased) as [`Retailer::Other`] and served by the
/// generic profile unless a YAML profile registers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Retailer {
    Woolworths,
    Coles,
    Aldi,
    Other(String),
}

impl Retailer {
    /// Stable lowercase identifier, e.g. `"coles"`.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Retailer::Woolworths => "woolworths",
            Retailer::Coles => "coles",
            Retailer::Aldi => "aldi",
            Retailer::Other(id) => id,
        }
    }
}

impl From<&str> for Retailer {
    fn from(raw: &str) -> Self {
        let id = raw.trim().to_lowercase();
        match id.as_str() {
            "woolworths" | "woolies" => Retailer::Woolworths,
            "coles" => Retailer::Coles,
            "aldi" => Retailer::Aldi,
            _ => Retailer::Other(id),
        }
    }
}

impl From<String> for Retailer {
    fn from(raw: String) -> Self {
        Retailer::from(raw.as_str())
    }
}

impl From<Retailer> for String {
    fn from(retailer: Retailer) -> Self {
        retailer.id().to_string()
    }
}

impl FromStr for Retailer {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Retailer::from(s))
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The extraction strategy that located a product in its payload, in chain
/// priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// A serialized framework page-state blob (`__NEXT_DATA__`, `__INITIAL_STATE__`, ...)
    /// or a whole JSON API response.
    AppState,
    /// `<script type="application/ld+json">` blocks.
    LinkedData,
    /// CSS-selector scraping of product tiles.
    Markup,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::AppState => write!(f, "app_state"),
            StrategyKind::LinkedData => write!(f, "linked_data"),
            StrategyKind::Markup => write!(f, "markup"),
        }
    }
}

/// A product listing normalized for cross-retailer price comparison.
///
/// Only ever constructed with a non-empty `name` and a non-negative
/// `current_price`; records that cannot satisfy both are rejected during
/// normalization rather than defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Retailer-assigned identifier (stockcode, product id, SKU).
    pub source_id: Option<String>,
    pub retailer: Retailer,
    pub name: String,

    pub current_price: Option<Decimal>,
    /// Pre-promotion price. Zero or negative source values are dropped.
    pub was_price: Option<Decimal>,
    /// `true` when `was_price > current_price`, or when the source declares a
    /// promotion type and carries no `was_price` at all.
    pub on_sale: bool,
    /// `was_price - current_price` when on a price-derived sale, else zero.
    pub savings: Decimal,
    /// Percentage off `was_price`, rounded to one decimal place.
    pub discount_percent: Decimal,
    /// Price per `unit_label`, e.g. `2.995` per `"kg"`.
    pub unit_price: Option<Decimal>,
    pub unit_label: Option<String>,

    pub brand: Option<String>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,

    pub extraction_strategy: StrategyKind,
    pub category: Option<String>,
    /// Source promotion label (e.g. Coles `"SPECIAL"`). Informative only.
    pub promotion_type: Option<String>,
}
