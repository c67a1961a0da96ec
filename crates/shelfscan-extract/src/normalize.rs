//! Normalization from [`SourceRecord`]s to [`shelfscan_core::Product`].
//!
//! Field mapping is data-driven: the retailer's [`shelfscan_core::FieldMap`] lists candidate
//! key paths per canonical field and the first one present wins. Price text
//! parsing is delegated to [`crate::parse`]; this module owns the mandatory
//! field checks and the derived sale economics.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelfscan_core::{Product, Retailer, RetailerProfile};
use thiserror::Error;

use crate::parse::parse_price_value;
use crate::record::SourceRecord;

/// Characters left as-is when a record value is substituted into a URL
/// template path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Why a record did not become a [`Product`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("record has no non-empty name")]
    MissingName,
    #[error("record has no price field")]
    MissingPrice,
    #[error("price field has no parseable amount")]
    UnparseablePrice,
    #[error("price is negative")]
    NegativePrice,
}

/// Sale figures derived from the current and previous price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleFigures {
    pub on_sale: bool,
    pub savings: Decimal,
    pub discount_percent: Decimal,
}

impl SaleFigures {
    const NONE: Self = Self {
        on_sale: false,
        savings: Decimal::ZERO,
        discount_percent: Decimal::ZERO,
    };
}

/// Computes `on_sale`, `savings` and `discount_percent`.
///
/// A sale exists when `was > current`. A source promotion label only counts
/// when there is no `was` price at all, and then carries no savings.
#[must_use]
pub fn derive_sale(current: Decimal, was: Option<Decimal>, promotion: Option<&str>) -> SaleFigures {
    match was {
        Some(was) if was > current && was > Decimal::ZERO => {
            let savings = was - current;
            let mut discount_percent = (savings * Decimal::ONE_HUNDRED / was)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            discount_percent.rescale(1);
            SaleFigures {
                on_sale: true,
                savings,
                discount_percent,
            }
        }
        Some(_) => SaleFigures::NONE,
        None if promotion.is_some_and(|p| !p.trim().is_empty()) => SaleFigures {
            on_sale: true,
            ..SaleFigures::NONE
        },
        None => SaleFigures::NONE,
    }
}

/// Maps one source record to a [`Product`] using `profile`'s field map.
///
/// # Errors
///
/// Returns the [`RejectionReason`] when the record lacks a non-empty name or a
/// non-negative current price. Nothing else rejects a record.
pub fn normalize_record(
    record: &SourceRecord,
    retailer: &Retailer,
    profile: &RetailerProfile,
) -> Result<Product, RejectionReason> {
    let fields = &profile.fields;

    let name = record
        .first_text(&fields.name)
        .ok_or(RejectionReason::MissingName)?;

    let (_, raw_price) = record
        .first_scalar(&fields.price)
        .ok_or(RejectionReason::MissingPrice)?;
    let price = parse_price_value(raw_price).ok_or(RejectionReason::UnparseablePrice)?;
    if price.amount < Decimal::ZERO {
        return Err(RejectionReason::NegativePrice);
    }
    let current = price.amount;

    let was_price = first_amount(record, &fields.was_price).filter(|w| *w > Decimal::ZERO);
    let promotion_type = record.first_text(&fields.promotion_type);
    let sale = derive_sale(current, was_price, promotion_type.as_deref());

    if let Some(flag) = first_flag(record, &fields.on_sale_flag) {
        if flag != sale.on_sale {
            tracing::debug!(
                name = %name,
                source_flag = flag,
                on_sale = sale.on_sale,
                "source sale flag disagrees with price-derived sale; keeping derived value"
            );
        }
    }

    let unit_price = first_amount(record, &fields.unit_price).or_else(|| {
        price
            .unit_label
            .as_ref()
            .map(|_| price.base_price().unwrap_or(price.amount))
    });
    let unit_label = record
        .first_text(&fields.unit_label)
        .or_else(|| price.unit_label.clone());

    let image_base = profile
        .image_base_url
        .as_deref()
        .or(profile.base_url.as_deref());
    let image_url = record
        .first_text(&fields.image)
        .and_then(|raw| resolve_url(&raw, image_base));
    let product_url = record
        .first_text(&fields.product_url)
        .and_then(|raw| resolve_url(&raw, profile.base_url.as_deref()))
        .or_else(|| {
            profile
                .product_url_template
                .as_deref()
                .and_then(|template| fill_template(template, record))
        });

    Ok(Product {
        source_id: record.first_text(&fields.source_id),
        retailer: retailer.clone(),
        name,
        current_price: Some(current),
        was_price,
        on_sale: sale.on_sale,
        savings: sale.savings,
        discount_percent: sale.discount_percent,
        unit_price,
        unit_label,
        brand: record
            .first_text(&fields.brand)
            .or_else(|| profile.default_brand.clone()),
        size: record.first_text(&fields.size),
        description: record.first_text(&fields.description),
        image_url,
        product_url,
        extraction_strategy: record.strategy(),
        category: record
            .first_text(&fields.category)
            .or_else(|| profile.default_category.clone()),
        promotion_type,
    })
}

fn first_amount(record: &SourceRecord, candidates: &[String]) -> Option<Decimal> {
    record
        .first_scalar(candidates)
        .and_then(|(_, v)| parse_price_value(v))
        .map(|p| p.amount)
}

fn first_flag(record: &SourceRecord, candidates: &[String]) -> Option<bool> {
    let (_, value) = record.first_scalar(candidates)?;
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// Makes `raw` absolute. Protocol-relative links get `https:`; paths are
/// joined to `base`. Returns `None` for a relative link with no base.
fn resolve_url(raw: &str, base: Option<&str>) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    let base = base?.trim_end_matches('/');
    Some(format!("{base}/{}", raw.trim_start_matches('/')))
}

/// Substitutes `{path}` placeholders with record values.
///
/// Placeholders the record cannot resolve become empty; if none resolve the
/// template yields nothing.
fn fill_template(template: &str, record: &SourceRecord) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut resolved = 0usize;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let path = after[..close].to_string();
        if let Some(value) = record.first_text(&[path]) {
            out.extend(utf8_percent_encode(&value, SEGMENT));
            resolved += 1;
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    (resolved > 0).then_some(out)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
