//! The raw page or API response handed to the engine by its supplier.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shelfscan_core::Retailer;

/// Declared content kind of a [`RawPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Json,
}

impl ContentKind {
    /// Infers the kind from an HTTP `Content-Type` header value.
    ///
    /// Returns `None` for types that are neither JSON nor HTML.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_ascii_lowercase();
        if lower.contains("json") {
            Some(ContentKind::Json)
        } else if lower.contains("html") {
            Some(ContentKind::Html)
        } else {
            None
        }
    }

    /// Guesses the kind from the body: JSON when the first non-whitespace
    /// byte opens an object or array, HTML otherwise.
    #[must_use]
    pub fn sniff(body: &[u8]) -> Self {
        match body.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{' | b'[') => ContentKind::Json,
            _ => ContentKind::Html,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Html => write!(f, "html"),
            ContentKind::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(ContentKind::Html),
            "json" => Ok(ContentKind::Json),
            other => Err(format!("unknown content kind '{other}' (expected html or json)")),
        }
    }
}

/// One retailer page or API response. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    body: Vec<u8>,
    content_kind: ContentKind,
    retailer: Retailer,
}

impl RawPayload {
    pub fn new(body: impl Into<Vec<u8>>, content_kind: ContentKind, retailer: Retailer) -> Self {
        Self {
            body: body.into(),
            content_kind,
            retailer,
        }
    }

    pub fn html(body: impl Into<Vec<u8>>, retailer: Retailer) -> Self {
        Self::new(body, ContentKind::Html, retailer)
    }

    pub fn json(body: impl Into<Vec<u8>>, retailer: Retailer) -> Self {
        Self::new(body, ContentKind::Json, retailer)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// The body as text. Invalid UTF-8 sequences are replaced, not rejected.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    #[must_use]
    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    #[must_use]
    pub fn retailer(&self) -> &Retailer {
        &self.retailer
    }

    /// Whether HTML strategies can read this payload. True for HTML, and for
    /// a payload declared JSON whose body is really markup (an error or
    /// block page served from an API URL).
    #[must_use]
    pub fn is_markup(&self) -> bool {
        match self.content_kind {
            ContentKind::Html => true,
            ContentKind::Json => ContentKind::sniff(&self.body) == ContentKind::Html,
        }
    }
}
