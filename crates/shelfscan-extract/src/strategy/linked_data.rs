//! Strategy 2: schema.org JSON-LD extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use shelfscan_core::StrategyKind;

use super::Strategy;
use crate::error::ExtractionError;
use crate::payload::RawPayload;
use crate::record::SourceRecord;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

const PRODUCT_TYPES: &[&str] = &["Product", "ProductGroup", "IndividualProduct", "Offer"];

/// Reads product and offer entries from `<script type="application/ld+json">`
/// blocks. Each block is parsed on its own; a malformed block is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedDataStrategy;

impl Strategy for LinkedDataStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinkedData
    }

    fn extract(&self, payload: &RawPayload) -> Result<Vec<SourceRecord>, ExtractionError> {
        if !payload.is_markup() {
            return Err(ExtractionError::UnsupportedContent {
                strategy: StrategyKind::LinkedData,
                kind: payload.content_kind(),
            });
        }

        let html = payload.text();
        let mut blocks = 0usize;
        let mut parsed = 0usize;
        let mut last_error = None;
        let mut records = Vec::new();

        for cap in SCRIPT_RE.captures_iter(&html) {
            let Some(body) = cap.get(1) else {
                continue;
            };
            blocks += 1;

            let value: Value = match serde_json::from_str(body.as_str().trim()) {
                Ok(v) => v,
                Err(error) => {
                    tracing::debug!(block = blocks, %error, "skipping malformed ld+json block");
                    last_error = Some(error);
                    continue;
                }
            };
            parsed += 1;

            for entry in product_entries(&value) {
                if let Some(record) = SourceRecord::from_value(StrategyKind::LinkedData, entry) {
                    records.push(record);
                }
            }
        }

        if blocks == 0 {
            return Err(ExtractionError::NoLinkedData);
        }
        if parsed == 0 {
            if let Some(source) = last_error {
                return Err(ExtractionError::InvalidJson {
                    marker: "application/ld+json".to_string(),
                    source,
                });
            }
        }
        if records.is_empty() {
            return Err(ExtractionError::NoProductNodes {
                context: format!("{blocks} ld+json block(s)"),
            });
        }
        Ok(records)
    }
}

/// Flattens one parsed block into its product-like entries.
///
/// Accepts a top-level object, a top-level array, and `@graph` containers.
/// Entries of an `itemListElement` list are included, with `ListItem`
/// wrappers unwrapped to their `item`.
fn product_entries(value: &Value) -> Vec<&Value> {
    let mut candidates: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let graphs: Vec<&Value> = candidates
        .iter()
        .filter_map(|item| item.get("@graph").and_then(Value::as_array))
        .flatten()
        .collect();
    candidates.extend(graphs);

    let mut entries = Vec::new();
    for candidate in candidates {
        if has_product_type(candidate) {
            entries.push(candidate);
            continue;
        }
        let Some(list) = candidate.get("itemListElement").and_then(Value::as_array) else {
            continue;
        };
        for element in list {
            let item = element.get("item").filter(|i| i.is_object()).unwrap_or(element);
            if has_product_type(item) || looks_like_product(item) {
                entries.push(item);
            }
        }
    }
    entries
}

/// `@type` may be a plain string or an array of strings.
fn has_product_type(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(t)) => is_product_type(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(is_product_type),
        _ => false,
    }
}

fn is_product_type(t: &str) -> bool {
    let t = t.rsplit('/').next().unwrap_or(t);
    PRODUCT_TYPES.iter().any(|p| t.eq_ignore_ascii_case(p))
}

/// Untyped list entries still count when they carry a name and an offer.
fn looks_like_product(item: &Value) -> bool {
    item.get("name").is_some_and(Value::is_string)
        && (item.get("offers").is_some() || item.get("price").is_some())
}
