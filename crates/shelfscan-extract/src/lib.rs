//! Multi-strategy product extraction and normalization.
//!
//! A [`RawPayload`] goes through its retailer's [`StrategyChain`] (page state,
//! then linked data, then markup) and every record the first applicable
//! strategy yields is normalized into a [`shelfscan_core::Product`].

pub mod error;
pub mod extractor;
pub mod normalize;
pub mod parse;
pub mod payload;
pub mod record;
pub mod strategy;

pub use error::ExtractionError;
pub use extractor::{Extraction, ExtractionReport, Extractor, ExtractorOptions};
pub use normalize::{derive_sale, normalize_record, RejectionReason, SaleFigures};
pub use parse::{parse_price_text, parse_price_value, PriceText};
pub use payload::{ContentKind, RawPayload};
pub use record::SourceRecord;
pub use strategy::{
    AttemptOutcome, ChainOptions, ChainOutcome, Strategy, StrategyAttempt, StrategyChain,
};
