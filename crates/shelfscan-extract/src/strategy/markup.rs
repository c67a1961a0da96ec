//! Strategy 3: product tiles in the rendered markup.
//!
//! Used when a page carries neither serialized state nor linked data. A list
//! of candidate tile selectors is tried in order; the first one that matches
//! anything is used exclusively. Each tile then goes through a fixed, ordered
//! set of fallback lookups per field.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use shelfscan_core::StrategyKind;

use super::Strategy;
use crate::error::ExtractionError;
use crate::payload::RawPayload;
use crate::record::{collapse_whitespace, SourceRecord};

/// Tile selectors tried after any retailer-specific ones, most specific first.
pub const GENERIC_SELECTORS: &[&str] = &[
    r#"[data-testid="product"]"#,
    r#"[data-testid="product-tile"]"#,
    "[data-product-id]",
    r#"[itemtype*="schema.org/Product"]"#,
    ".product-tile",
    ".product-card",
    ".special-buy",
    r#"[class*="ProductTile"]"#,
    r#"[class*="product"]"#,
    r#"[class*="special"]"#,
    ".box--wrapper",
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4"));
static ITEMPROP_NAME: LazyLock<Selector> = LazyLock::new(|| selector(r#"[itemprop="name"]"#));
static CANONICAL_PRICE: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[itemprop="price"], [data-testid="product-pricing"], .price"#)
});
static CLASSED: LazyLock<Selector> = LazyLock::new(|| selector("[class]"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static TILE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.product-tile__link"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

const ID_ATTRIBUTES: &[&str] = &["data-product-id", "data-id", "data-sku"];

pub struct MarkupStrategy {
    selectors: Vec<(String, Selector)>,
}

impl MarkupStrategy {
    /// `preferred` selectors are tried before [`GENERIC_SELECTORS`]. Selectors
    /// that do not parse are logged and skipped.
    #[must_use]
    pub fn new(preferred: &[String]) -> Self {
        let mut seen = HashSet::new();
        let selectors = preferred
            .iter()
            .map(String::as_str)
            .chain(GENERIC_SELECTORS.iter().copied())
            .filter(|css| seen.insert(*css))
            .filter_map(|css| match Selector::parse(css) {
                Ok(parsed) => Some((css.to_string(), parsed)),
                Err(error) => {
                    tracing::warn!(selector = css, %error, "skipping invalid tile selector");
                    None
                }
            })
            .collect();
        Self { selectors }
    }
}

impl Strategy for MarkupStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Markup
    }

    fn extract(&self, payload: &RawPayload) -> Result<Vec<SourceRecord>, ExtractionError> {
        if !payload.is_markup() {
            return Err(ExtractionError::UnsupportedContent {
                strategy: StrategyKind::Markup,
                kind: payload.content_kind(),
            });
        }

        let document = Html::parse_document(&payload.text());

        for (css, sel) in &self.selectors {
            let matched: Vec<ElementRef<'_>> = document.select(sel).collect();
            if matched.is_empty() {
                continue;
            }

            let tiles = outermost(&matched);
            tracing::debug!(selector = %css, tiles = tiles.len(), "tile selector matched");

            let records: Vec<SourceRecord> = tiles
                .iter()
                .filter_map(|tile| SourceRecord::new(StrategyKind::Markup, tile_fields(*tile)))
                .collect();

            if records.is_empty() {
                return Err(ExtractionError::EmptyTiles {
                    selector: css.clone(),
                    matched: tiles.len(),
                });
            }
            return Ok(records);
        }

        Err(ExtractionError::NoSelectorMatch)
    }
}

/// Drops matches nested inside another match, so a loose attribute-substring
/// selector does not also pick up a tile's own sub-elements.
fn outermost<'a>(matched: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    let ids: HashSet<_> = matched.iter().map(|el| el.id()).collect();
    matched
        .iter()
        .filter(|el| !el.ancestors().any(|a| ids.contains(&a.id())))
        .copied()
        .collect()
}

fn tile_fields(tile: ElementRef<'_>) -> Map<String, Value> {
    let mut fields = Map::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            fields.insert(key.to_string(), Value::String(v));
        }
    };

    let link = tile
        .select(&TILE_LINK)
        .next()
        .or_else(|| tile.select(&ANY_LINK).next());
    let href = link.and_then(|a| a.value().attr("href")).map(str::to_string);

    put("name", tile_name(tile));
    put("price", tile_price(tile));
    put("image", tile_image(tile));
    put("brand", first_classed(tile, "brand").map(text_of));
    put("id", tile_id(tile, href.as_deref()));
    put("url", href);

    fields
}

fn tile_name(tile: ElementRef<'_>) -> Option<String> {
    attr_text(tile, "title")
        .or_else(|| first_text(tile, &ITEMPROP_NAME))
        .or_else(|| first_text(tile, &HEADING))
        .or_else(|| first_classed(tile, "title").map(text_of))
        .or_else(|| first_text(tile, &ANY_LINK))
        .filter(|s| !s.is_empty())
}

/// The canonical price element if present, otherwise the innermost element
/// whose class mentions "price".
fn tile_price(tile: ElementRef<'_>) -> Option<String> {
    if let Some(el) = tile.select(&CANONICAL_PRICE).next() {
        let text = attr_text(el, "content").unwrap_or_else(|| text_of(el));
        if !text.is_empty() {
            return Some(text);
        }
    }

    let candidates: Vec<ElementRef<'_>> = tile
        .select(&CLASSED)
        .filter(|el| el.id() != tile.id() && class_contains(*el, "price"))
        .collect();
    let candidate_ids: HashSet<_> = candidates.iter().map(|el| el.id()).collect();

    candidates
        .iter()
        .filter(|el| {
            !el.descendants()
                .any(|d| d.id() != el.id() && candidate_ids.contains(&d.id()))
        })
        .map(|el| text_of(*el))
        .find(|t| !t.is_empty())
}

fn tile_image(tile: ElementRef<'_>) -> Option<String> {
    let img = tile.select(&IMAGE).next()?;
    attr_text(img, "src").or_else(|| attr_text(img, "data-src"))
}

fn tile_id(tile: ElementRef<'_>, href: Option<&str>) -> Option<String> {
    ID_ATTRIBUTES
        .iter()
        .find_map(|attr| attr_text(tile, attr))
        .or_else(|| {
            let href = href?;
            if !href.contains("/product/") {
                return None;
            }
            href.split(['?', '#'])
                .next()?
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .map(text_of)
        .find(|t| !t.is_empty())
}

fn first_classed<'a>(scope: ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    scope
        .select(&CLASSED)
        .find(|el| el.id() != scope.id() && class_contains(*el, needle))
}

fn class_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|c| c.to_ascii_lowercase().contains(needle))
}

fn attr_text(el: ElementRef<'_>, attr: &str) -> Option<String> {
    el.value()
        .attr(attr)
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}
