use thiserror::Error;

use shelfscan_core::StrategyKind;

use crate::payload::ContentKind;

/// Why a strategy could not produce records for a payload.
///
/// Every variant means "not applicable, try the next strategy"; none of them
/// is surfaced to the caller as a failure of the extraction call.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{strategy} does not handle {kind} payloads")]
    UnsupportedContent {
        strategy: StrategyKind,
        kind: ContentKind,
    },

    #[error("no page-state marker found")]
    MarkerNotFound,

    #[error("content at {marker} is not valid JSON: {source}")]
    InvalidJson {
        marker: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no linked-data script blocks found")]
    NoLinkedData,

    #[error("no product-shaped entries in {context}")]
    NoProductNodes { context: String },

    #[error("no candidate selector matched any element")]
    NoSelectorMatch,

    #[error("selector {selector} matched {matched} elements but none carried product fields")]
    EmptyTiles { selector: String, matched: usize },

    #[error("strategy panicked: {0}")]
    StrategyPanicked(String),
}
