//! Extraction strategies and the priority chain that runs them.
//!
//! Each strategy is one self-contained heuristic for locating product data in
//! a payload. The chain tries them in priority order and stops at the first
//! one that yields at least one record; a later strategy never runs once an
//! earlier one has succeeded, even if it might find more.

mod app_state;
mod linked_data;
mod markup;

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use shelfscan_core::{RetailerProfile, StrategyKind};

use crate::error::ExtractionError;
use crate::payload::RawPayload;
use crate::record::SourceRecord;

pub use app_state::{find_product_nodes, AppStateStrategy, MarkerKind, DEFAULT_STATE_MARKERS};
pub use linked_data::LinkedDataStrategy;
pub use markup::{MarkupStrategy, GENERIC_SELECTORS};

/// Default depth cap for the page-state tree search.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default cap on nodes visited by one page-state tree search.
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// One heuristic for locating product records in a payload.
///
/// `Ok` with at least one record means the strategy applied. `Ok` with no
/// records, or any `Err`, means "not applicable" and the chain moves on.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// # Errors
    ///
    /// Returns an [`ExtractionError`] describing why the strategy does not
    /// apply to `payload`.
    fn extract(&self, payload: &RawPayload) -> Result<Vec<SourceRecord>, ExtractionError>;
}

/// How a single strategy fared against a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Yielded,
    Inapplicable,
    Panicked,
}

/// One entry in the chain's attempt trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub outcome: AttemptOutcome,
    pub records: usize,
    /// Why the strategy did not apply; `None` when it yielded records.
    pub reason: Option<String>,
}

/// Result of running a chain over one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub strategy_used: Option<StrategyKind>,
    pub records: Vec<SourceRecord>,
    pub attempts: Vec<StrategyAttempt>,
}

/// Bounds applied to the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOptions {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// An ordered, immutable list of strategies.
pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.kind()))
            .finish()
    }
}

impl StrategyChain {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// The canonical chain for a retailer: page state, then linked data, then
    /// markup, each seeded with the profile's site-verified markers and
    /// selectors ahead of the generic ones.
    #[must_use]
    pub fn for_profile(profile: &RetailerProfile, options: ChainOptions) -> Self {
        Self::new(vec![
            Box::new(AppStateStrategy::new(
                &profile.state_markers,
                options.max_depth,
                options.max_nodes,
            )),
            Box::new(LinkedDataStrategy),
            Box::new(MarkupStrategy::new(&profile.selectors)),
        ])
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Runs the strategies in order until one yields records.
    ///
    /// Never fails: errors and panics from a strategy are recorded in the
    /// attempt trail and treated as "not applicable".
    #[must_use]
    pub fn run(&self, payload: &RawPayload) -> ChainOutcome {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(payload)));

            match result {
                Ok(Ok(records)) if !records.is_empty() => {
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Yielded,
                        records: records.len(),
                        reason: None,
                    });
                    return ChainOutcome {
                        strategy_used: Some(kind),
                        records,
                        attempts,
                    };
                }
                Ok(Ok(_)) => {
                    tracing::debug!(strategy = %kind, "strategy yielded no records");
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Inapplicable,
                        records: 0,
                        reason: Some("no records".to_string()),
                    });
                }
                Ok(Err(error)) => {
                    tracing::debug!(strategy = %kind, %error, "strategy not applicable");
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Inapplicable,
                        records: 0,
                        reason: Some(error.to_string()),
                    });
                }
                Err(panic_payload) => {
                    let error = ExtractionError::StrategyPanicked(panic_message(&*panic_payload));
                    tracing::warn!(strategy = %kind, %error, "strategy panicked");
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Panicked,
                        records: 0,
                        reason: Some(error.to_string()),
                    });
                }
            }
        }

        ChainOutcome {
            strategy_used: None,
            records: Vec::new(),
            attempts,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
