//! Strategy 1: serialized application state.
//!
//! Framework-rendered storefronts ship the data their components hydrate from
//! as one JSON blob inside the page: Next.js `<script id="__NEXT_DATA__">`,
//! Redux-style `window.__INITIAL_STATE__ = {...}`, Nuxt `window.__NUXT__`.
//! JSON API responses are treated as that blob directly. The blob is searched
//! for product-shaped objects with an explicit, bounded work stack.

use serde_json::{Map, Value};
use shelfscan_core::{StateMarker, StrategyKind};

use super::Strategy;
use crate::error::ExtractionError;
use crate::payload::RawPayload;
use crate::record::SourceRecord;

/// Markers tried after any retailer-specific ones, in order.
pub const DEFAULT_STATE_MARKERS: &[(MarkerKind, &str)] = &[
    (MarkerKind::ScriptId, "__NEXT_DATA__"),
    (MarkerKind::Assignment, "window.__INITIAL_STATE__"),
    (MarkerKind::Assignment, "window.__NUXT__"),
    (MarkerKind::Assignment, "window.__PRELOADED_STATE__"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    ScriptId,
    Assignment,
}

const NAME_KEYS: &[&str] = &["name", "Name", "DisplayName", "title", "productName"];
const PRICE_KEYS: &[&str] = &["price", "Price", "pricing", "prices", "offers", "currentPrice"];

/// Fields that usually hold the product list; searched before siblings.
const LIST_KEYS: &[&str] = &[
    "products",
    "items",
    "results",
    "specials",
    "productlist",
    "catalogitems",
];

pub struct AppStateStrategy {
    markers: Vec<StateMarker>,
    max_depth: usize,
    max_nodes: usize,
}

impl AppStateStrategy {
    /// `preferred` markers are tried before [`DEFAULT_STATE_MARKERS`].
    #[must_use]
    pub fn new(preferred: &[StateMarker], max_depth: usize, max_nodes: usize) -> Self {
        let mut markers: Vec<StateMarker> = preferred.to_vec();
        for (kind, name) in DEFAULT_STATE_MARKERS {
            let marker = match kind {
                MarkerKind::ScriptId => StateMarker::ScriptId((*name).to_string()),
                MarkerKind::Assignment => StateMarker::Assignment((*name).to_string()),
            };
            if !markers.contains(&marker) {
                markers.push(marker);
            }
        }
        Self {
            markers,
            max_depth,
            max_nodes,
        }
    }

    /// Finds the first configured marker present in `html` and returns its
    /// label with the raw text that should hold JSON.
    fn locate_blob<'h>(&self, html: &'h str) -> Option<(String, &'h str)> {
        self.markers.iter().find_map(|marker| match marker {
            StateMarker::ScriptId(id) => {
                script_by_id(html, id).map(|text| (format!("script#{id}"), text))
            }
            StateMarker::Assignment(name) => {
                assigned_value(html, name).map(|text| (name.clone(), text))
            }
        })
    }
}

impl Strategy for AppStateStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AppState
    }

    fn extract(&self, payload: &RawPayload) -> Result<Vec<SourceRecord>, ExtractionError> {
        let text = payload.text();

        let (marker, blob) = if payload.is_markup() {
            self.locate_blob(&text)
                .ok_or(ExtractionError::MarkerNotFound)?
        } else {
            ("response body".to_string(), &*text)
        };

        let state: Value = serde_json::from_str(blob.trim()).map_err(|source| {
            ExtractionError::InvalidJson {
                marker: marker.clone(),
                source,
            }
        })?;

        let records: Vec<SourceRecord> = find_product_nodes(&state, self.max_depth, self.max_nodes)
            .into_iter()
            .filter_map(|map| SourceRecord::new(StrategyKind::AppState, map.clone()))
            .collect();

        if records.is_empty() {
            return Err(ExtractionError::NoProductNodes { context: marker });
        }
        Ok(records)
    }
}

/// Text content of `<script id="{id}" ...>...</script>`.
fn script_by_id<'h>(html: &'h str, id: &str) -> Option<&'h str> {
    ['"', '\''].into_iter().find_map(|quote| {
        let needle = format!("id={quote}{id}{quote}");
        let attr_pos = html.find(&needle)?;
        let open_end = attr_pos + html[attr_pos..].find('>')? + 1;
        let close = open_end + html[open_end..].find("</script")?;
        Some(&html[open_end..close])
    })
}

/// The value assigned by `{name} = ...` in an inline script.
///
/// An object or array literal is cut out with a string-aware bracket scan.
/// Comparisons (`==`, `===`) are not assignments. When no assignment holds a
/// literal, the first one is returned up to the end of its statement so that
/// JSON parsing rejects it.
fn assigned_value<'h>(html: &'h str, name: &str) -> Option<&'h str> {
    let mut first_statement = None;
    let mut search_from = 0;
    while let Some(rel) = html[search_from..].find(name) {
        let after_name = search_from + rel + name.len();
        search_from = after_name;

        let rest = html[after_name..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        if rest.starts_with('=') {
            continue;
        }
        let rest = rest.trim_start();

        if let Some(literal) = extract_balanced(rest) {
            return Some(literal);
        }
        if first_statement.is_none() {
            let end = rest
                .find("</script")
                .or_else(|| rest.find(';'))
                .unwrap_or(rest.len());
            first_statement = Some(&rest[..end]);
        }
    }
    first_statement
}

/// Returns the shortest prefix of `s` that forms a complete `{...}` or
/// `[...]` literal, or `None` if `s` does not start with one or it is
/// unterminated.
///
/// Tracks bracket depth while skipping string literals and escape sequences,
/// so braces inside strings are not counted.
pub(crate) fn extract_balanced(s: &str) -> Option<&str> {
    if !(s.starts_with('{') || s.starts_with('[')) {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}

/// Collects product-shaped objects from a parsed state tree, in document order.
///
/// An object is product-shaped when it has a string name-like key and a
/// non-null price-like key. Matched objects are not searched further. Named
/// list fields (`products`, `items`, `results`, ...) are searched before the
/// other fields of the same object. Nodes deeper than `max_depth` are
/// skipped, and the search stops after `max_nodes` visits.
#[must_use]
pub fn find_product_nodes(
    root: &Value,
    max_depth: usize,
    max_nodes: usize,
) -> Vec<&Map<String, Value>> {
    let mut found = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];
    let mut visited = 0usize;

    while let Some((node, depth)) = stack.pop() {
        visited += 1;
        if visited > max_nodes {
            tracing::debug!(max_nodes, "state search node budget exhausted");
            break;
        }

        match node {
            Value::Object(map) => {
                if is_product_shaped(map) {
                    found.push(map);
                    continue;
                }
                if depth >= max_depth {
                    continue;
                }
                let (lists, others): (Vec<_>, Vec<_>) = map
                    .iter()
                    .filter(|(_, v)| v.is_object() || v.is_array())
                    .partition(|(k, v)| v.is_array() && is_list_key(k));
                // Reversed so that pops come out in document order, lists first.
                for (_, child) in lists.into_iter().chain(others).rev() {
                    stack.push((child, depth + 1));
                }
            }
            Value::Array(items) => {
                if depth >= max_depth {
                    continue;
                }
                for child in items.iter().rev() {
                    if child.is_object() || child.is_array() {
                        stack.push((child, depth + 1));
                    }
                }
            }
            _ => {}
        }
    }

    found
}

fn is_product_shaped(map: &Map<String, Value>) -> bool {
    let has_name = NAME_KEYS
        .iter()
        .any(|k| map.get(*k).is_some_and(Value::is_string));
    let has_price = PRICE_KEYS
        .iter()
        .any(|k| map.get(*k).is_some_and(|v| !v.is_null()));
    has_name && has_price
}

fn is_list_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    LIST_KEYS.contains(&lower.as_str())
}
