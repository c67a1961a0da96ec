//! The extraction coordinator: strategy chain, then normalizer, then report.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use shelfscan_core::{Product, Retailer, RetailerProfile, RetailerProfiles, StrategyKind};

use crate::normalize::{normalize_record, RejectionReason};
use crate::payload::RawPayload;
use crate::strategy::{ChainOptions, StrategyAttempt, StrategyChain};

/// Tuning for the built-in strategies.
pub type ExtractorOptions = ChainOptions;

/// What happened to one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub retailer: String,
    /// `None` when no strategy applied.
    pub strategy_used: Option<StrategyKind>,
    pub records_seen: usize,
    pub records_rejected: usize,
    pub products_emitted: usize,
    pub rejection_reasons: BTreeMap<RejectionReason, usize>,
    /// Every strategy tried, in order, with the reason it did not apply.
    pub attempts: Vec<StrategyAttempt>,
}

impl ExtractionReport {
    /// No strategy yielded records. Callers may want to keep the raw payload
    /// for manual inspection.
    #[must_use]
    pub fn no_strategy_applicable(&self) -> bool {
        self.strategy_used.is_none()
    }
}

/// Products extracted from one payload, in source order, plus the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub products: Vec<Product>,
    pub report: ExtractionReport,
}

/// Runs payloads through their retailer's strategy chain and normalizer.
///
/// Built once and shared read-only; `extract` takes `&self` and holds no
/// per-call state, so one instance can serve concurrent callers.
#[derive(Debug)]
pub struct Extractor {
    profiles: RetailerProfiles,
    chains: HashMap<Retailer, StrategyChain>,
    fallback_chain: StrategyChain,
}

impl Extractor {
    #[must_use]
    pub fn new(profiles: RetailerProfiles, options: ExtractorOptions) -> Self {
        let chains = profiles
            .iter()
            .map(|profile| {
                (
                    profile.retailer.clone(),
                    StrategyChain::for_profile(profile, options),
                )
            })
            .collect();
        let fallback_chain = StrategyChain::for_profile(
            &RetailerProfile::generic(Retailer::Other("generic".to_string())),
            options,
        );
        Self {
            profiles,
            chains,
            fallback_chain,
        }
    }

    /// Replaces the chain used for `retailer`.
    #[must_use]
    pub fn with_chain(mut self, retailer: Retailer, chain: StrategyChain) -> Self {
        self.chains.insert(retailer, chain);
        self
    }

    #[must_use]
    pub fn profiles(&self) -> &RetailerProfiles {
        &self.profiles
    }

    /// Extracts every product from `payload`.
    ///
    /// Never fails. A payload no strategy can read yields no products and a
    /// report with `strategy_used: None`.
    #[must_use]
    pub fn extract(&self, payload: &RawPayload) -> Extraction {
        let retailer = payload.retailer();
        let profile = self.profiles.get(retailer);
        let chain = self.chains.get(retailer).unwrap_or(&self.fallback_chain);

        let outcome = chain.run(payload);

        let mut report = ExtractionReport {
            retailer: retailer.id().to_string(),
            strategy_used: outcome.strategy_used,
            records_seen: outcome.records.len(),
            attempts: outcome.attempts,
            ..ExtractionReport::default()
        };

        let mut products = Vec::with_capacity(outcome.records.len());
        for record in &outcome.records {
            match normalize_record(record, retailer, profile) {
                Ok(product) => products.push(product),
                Err(reason) => {
                    tracing::debug!(retailer = %retailer, %reason, "record rejected");
                    report.records_rejected += 1;
                    *report.rejection_reasons.entry(reason).or_insert(0) += 1;
                }
            }
        }
        report.products_emitted = products.len();

        match report.strategy_used {
            Some(strategy) => tracing::info!(
                retailer = %retailer,
                strategy = %strategy,
                records_seen = report.records_seen,
                records_rejected = report.records_rejected,
                products = report.products_emitted,
                "extraction complete"
            ),
            None => tracing::warn!(
                retailer = %retailer,
                attempts = report.attempts.len(),
                "no strategy applicable to payload"
            ),
        }

        Extraction { products, report }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(RetailerProfiles::builtin(), ExtractorOptions::default())
    }
}
