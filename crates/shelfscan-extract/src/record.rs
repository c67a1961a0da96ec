//! Source-native records: product data as found in the page, before
//! normalization.

use serde_json::{Map, Value};
use shelfscan_core::StrategyKind;

/// Longest key path the lookup helpers will follow.
const MAX_PATH_SEGMENTS: usize = 16;

/// An untyped key/value product record tagged with the strategy that found it.
///
/// Always non-empty; [`SourceRecord::new`] refuses an empty map.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    strategy: StrategyKind,
    fields: Map<String, Value>,
}

impl SourceRecord {
    /// Wraps `fields`, or returns `None` when there is nothing to wrap.
    #[must_use]
    pub fn new(strategy: StrategyKind, fields: Map<String, Value>) -> Option<Self> {
        if fields.is_empty() {
            None
        } else {
            Some(Self { strategy, fields })
        }
    }

    /// Wraps `value` if it is a non-empty JSON object.
    #[must_use]
    pub fn from_value(strategy: StrategyKind, value: &Value) -> Option<Self> {
        value
            .as_object()
            .and_then(|map| Self::new(strategy, map.clone()))
    }

    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Resolves a dot-separated key path such as `pricing.now` or
    /// `imageUris.0.uri`.
    ///
    /// Numeric segments index arrays. A named segment applied to an array is
    /// looked up in the array's first element, so `offers.price` works whether
    /// `offers` is an object or a list of offers.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;

        for segment in segments.take(MAX_PATH_SEGMENTS) {
            current = step(current, segment)?;
        }
        Some(current)
    }

    /// The first candidate path that resolves to a scalar. Nulls, containers
    /// and blank strings are passed over.
    #[must_use]
    pub fn first_scalar<'a>(&'a self, candidates: &'a [String]) -> Option<(&'a str, &'a Value)> {
        candidates.iter().find_map(|path| {
            self.lookup(path)
                .filter(|v| is_scalar(v))
                .map(|v| (path.as_str(), v))
        })
    }

    /// The first candidate path that resolves to non-blank text.
    ///
    /// Numbers and booleans are rendered as text; whitespace is collapsed.
    #[must_use]
    pub fn first_text(&self, candidates: &[String]) -> Option<String> {
        candidates
            .iter()
            .filter_map(|path| self.lookup(path))
            .find_map(scalar_text)
    }
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => match segment.parse::<usize>() {
            Ok(index) => items.get(index),
            Err(_) => items.first()?.as_object()?.get(segment),
        },
        _ => None,
    }
}

fn is_scalar(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) | Value::Bool(_) => true,
        _ => false,
    }
}

/// Renders a scalar as trimmed, whitespace-collapsed text. `None` for blank
/// strings, nulls and containers.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let collapsed = collapse_whitespace(s);
            (!collapsed.is_empty()).then_some(collapsed)
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
