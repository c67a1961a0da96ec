//! `extract` and `retailers` command handlers.

use std::path::Path;

use anyhow::Context;
use shelfscan_core::{AppConfig, Retailer, RetailerProfiles};
use shelfscan_extract::{ContentKind, Extractor, ExtractorOptions, RawPayload};
use tokio::io::AsyncReadExt;

use crate::output::{print_json, PayloadOutput, RetailerSummary};

/// Built-in profiles, plus the YAML file named by `SHELFSCAN_RETAILERS_PATH`
/// when set.
pub(crate) fn load_profiles(config: &AppConfig) -> anyhow::Result<RetailerProfiles> {
    match &config.retailers_path {
        Some(path) => {
            let file = shelfscan_core::load_retailer_profiles(path)
                .with_context(|| format!("loading retailer profiles from {}", path.display()))?;
            tracing::debug!(
                path = %path.display(),
                profiles = file.retailers.len(),
                "loaded retailer profile overrides"
            );
            Ok(RetailerProfiles::with_file(file))
        }
        None => Ok(RetailerProfiles::builtin()),
    }
}

pub(crate) fn build_extractor(config: &AppConfig) -> anyhow::Result<Extractor> {
    let profiles = load_profiles(config)?;
    let options = ExtractorOptions {
        max_depth: config.max_traversal_depth,
        ..ExtractorOptions::default()
    };
    Ok(Extractor::new(profiles, options))
}

/// Resolves a retailer id, warning when it has no profile of its own.
pub(crate) fn resolve_retailer(extractor: &Extractor, raw: &str) -> Retailer {
    let retailer = Retailer::from(raw);
    if !extractor.profiles().contains(&retailer) {
        tracing::warn!(retailer = %retailer, "no profile for retailer; using generic field map");
    }
    retailer
}

/// `--kind` if given, else the file extension, else a look at the body.
pub(crate) fn infer_kind(explicit: Option<ContentKind>, input: &Path, body: &[u8]) -> ContentKind {
    explicit
        .or_else(|| {
            input
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| ext.parse().ok())
        })
        .unwrap_or_else(|| ContentKind::sniff(body))
}

async fn read_input(input: &Path) -> anyhow::Result<Vec<u8>> {
    if input.as_os_str() == "-" {
        let mut body = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut body)
            .await
            .context("reading payload from stdin")?;
        Ok(body)
    } else {
        tokio::fs::read(input)
            .await
            .with_context(|| format!("reading payload from {}", input.display()))
    }
}

/// Extract products from one saved payload and print them as JSON.
///
/// # Errors
///
/// Returns an error if the profiles or the input cannot be read. A payload no
/// strategy applies to is not an error; it prints an empty product list.
pub(crate) async fn run_extract(
    config: &AppConfig,
    retailer: &str,
    kind: Option<ContentKind>,
    input: &Path,
) -> anyhow::Result<()> {
    let extractor = build_extractor(config)?;
    let retailer = resolve_retailer(&extractor, retailer);

    let body = read_input(input).await?;
    let kind = infer_kind(kind, input, &body);
    let payload = RawPayload::new(body, kind, retailer);

    let extraction = extractor.extract(&payload);
    if extraction.report.no_strategy_applicable() {
        tracing::warn!(
            input = %input.display(),
            "no strategy matched; keep the payload for manual inspection"
        );
    }

    print_json(&PayloadOutput {
        source: input.display().to_string(),
        fetched_at: None,
        extraction: &extraction,
    })
}

/// Print every retailer profile in effect.
///
/// # Errors
///
/// Returns an error if the retailers file cannot be loaded.
pub(crate) fn run_list_retailers(config: &AppConfig) -> anyhow::Result<()> {
    let profiles = load_profiles(config)?;
    let summaries: Vec<RetailerSummary<'_>> = profiles.iter().map(RetailerSummary::from).collect();
    print_json(&summaries)
}
