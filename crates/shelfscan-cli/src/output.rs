//! JSON shapes printed to stdout.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shelfscan_core::{RetailerProfile, StateMarker};
use shelfscan_extract::Extraction;

/// Products and report for one payload, tagged with where it came from.
#[derive(Debug, Serialize)]
pub(crate) struct PayloadOutput<'a> {
    /// File path or URL.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extraction: &'a Extraction,
}

#[derive(Debug, Serialize)]
pub(crate) struct RetailerSummary<'a> {
    pub id: &'a str,
    pub display_name: &'a str,
    pub base_url: Option<&'a str>,
    pub state_markers: Vec<String>,
    pub selectors: &'a [String],
}

impl<'a> From<&'a RetailerProfile> for RetailerSummary<'a> {
    fn from(profile: &'a RetailerProfile) -> Self {
        Self {
            id: profile.retailer.id(),
            display_name: &profile.display_name,
            base_url: profile.base_url.as_deref(),
            state_markers: profile
                .state_markers
                .iter()
                .map(|m| match m {
                    StateMarker::ScriptId(id) => format!("script#{id}"),
                    StateMarker::Assignment(name) => format!("{name} ="),
                })
                .collect(),
            selectors: &profile.selectors,
        }
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;
    use shelfscan_core::Retailer;
    use shelfscan_extract::{Extractor, RawPayload};

    use super::*;

    #[test]
    fn payload_output_flattens_extraction() {
        let extraction = Extractor::default().extract(&RawPayload::html("", Retailer::Aldi));
        let output = PayloadOutput {
            source: "https://www.aldi.com.au/fruit-vegetables".to_string(),
            fetched_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()),
            extraction: &extraction,
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["products"], json!([]));
        assert_eq!(value["report"]["strategy_used"], json!(null));
        assert_eq!(value["fetched_at"], json!("2026-03-01T09:30:00Z"));
    }

    #[test]
    fn saved_payload_output_omits_fetch_time() {
        let extraction = Extractor::default().extract(&RawPayload::html("", Retailer::Aldi));
        let output = PayloadOutput {
            source: "page.html".to_string(),
            fetched_at: None,
            extraction: &extraction,
        };
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("fetched_at").is_none());
    }

    #[test]
    fn retailer_summary_describes_markers() {
        let coles = RetailerProfile::coles();
        let summary = RetailerSummary::from(&coles);
        assert_eq!(summary.id, "coles");
        assert_eq!(summary.state_markers, vec!["script#__NEXT_DATA__"]);
    }
}
