//! Price parsing for the mixed number/text price fields retailers expose.
//!
//! Prices arrive as JSON numbers (`7.5`), plain strings (`"7.50"`), or
//! display text with currency symbols and unit annotations
//! (`"($1.49 per 1 each)"`, `"$0.35 / 1EA"`). All of them parse into an
//! exact [`Decimal`] amount plus optional unit information.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Number, Value};

/// Decimal places kept on a derived per-unit price.
const UNIT_PRICE_DP: u32 = 4;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|-?\.\d+").expect("valid number regex")
});

/// `per <qty> <unit>` or `/ <qty><unit>` at the end of a price string,
/// optionally closed by a parenthesis.
static PER_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bper\b|/)\s*(?P<qty>\d+(?:\.\d+)?)?\s*(?P<unit>[a-z][^)]*?)\s*\)?\s*$")
        .expect("valid per-unit regex")
});

/// A price read from a source value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceText {
    pub amount: Decimal,
    /// The `2` in `"$5.99 per 2 kg"`.
    pub quantity: Option<Decimal>,
    /// The `kg` in `"$5.99 per 2 kg"`.
    pub unit_label: Option<String>,
}

impl PriceText {
    fn plain(amount: Decimal) -> Self {
        Self {
            amount,
            quantity: None,
            unit_label: None,
        }
    }

    /// Price per single `unit_label`, derived only when the annotation names
    /// a quantity other than one.
    #[must_use]
    pub fn base_price(&self) -> Option<Decimal> {
        let quantity = self.quantity?;
        if quantity <= Decimal::ZERO || quantity == Decimal::ONE {
            return None;
        }
        self.amount
            .checked_div(quantity)
            .map(|p| p.round_dp(UNIT_PRICE_DP))
    }
}

/// Parses a JSON price value. Containers, booleans and text with no number
/// in it yield `None`.
#[must_use]
pub fn parse_price_value(value: &Value) -> Option<PriceText> {
    match value {
        Value::Number(n) => decimal_from_number(n).map(PriceText::plain),
        Value::String(s) => parse_price_text(s),
        _ => None,
    }
}

/// Parses display text such as `"$5.99 per 2 kg"`.
///
/// The first decimal number is the amount; a trailing `per`/`/` annotation
/// supplies the quantity and unit label, unless another number sits between
/// the amount and the annotation.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<PriceText> {
    let m = NUMBER_RE.find(text)?;
    let amount = parse_decimal(m.as_str())?;
    let rest = &text[m.end()..];

    let Some(caps) = PER_UNIT_RE.captures(rest) else {
        return Some(PriceText::plain(amount));
    };
    // The annotation belongs to whichever number it follows.
    let gap = caps.get(0).map_or(rest, |whole| &rest[..whole.start()]);
    if gap.chars().any(|c| c.is_ascii_digit()) {
        return Some(PriceText::plain(amount));
    }

    let quantity = caps
        .name("qty")
        .and_then(|q| Decimal::from_str(q.as_str()).ok());
    let unit_label = caps
        .name("unit")
        .map(|u| u.as_str().trim().to_string())
        .filter(|u| !u.is_empty());

    Some(PriceText {
        amount,
        quantity,
        unit_label,
    })
}

/// Parses a JSON number exactly, going through its decimal text rather than
/// an `f64` so `7.5` stays `7.5`.
#[must_use]
pub fn decimal_from_number(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
