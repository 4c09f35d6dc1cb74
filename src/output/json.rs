//! JSON output formatting
//!
//! The report is the assessment as produced, wrapped with the effective
//! configuration and a UTC timestamp. Histogram edges are expanded so
//! consumers do not need to recompute them from the bin width.

use crate::assessment::AssessmentReport;
use crate::config::Config;
use crate::stats::histogram::HistogramBin;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Top-level JSON document
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    /// RFC 3339, UTC
    pub generated_at: String,
    pub config: &'a Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram_bins: Option<Vec<HistogramBin>>,
    pub report: &'a AssessmentReport,
}

/// Build the JSON document for a finished assessment
pub fn build_json_report<'a>(
    config: &'a Config,
    report: &'a AssessmentReport,
    generated_at: DateTime<Utc>,
) -> JsonReport<'a> {
    JsonReport {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        config,
        histogram_bins: report.monte_carlo.as_ref().map(|mc| mc.run.histogram.bins()),
        report,
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, json: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(writer, json)?;
    } else {
        serde_json::to_writer(writer, json)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::run_assessment;
    use crate::compliance::ThresholdTable;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_json_report_shape() {
        let config = Config::default();
        let report = run_assessment(&config, &ThresholdTable::default());
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(build_json_report(&config, &report, at)).unwrap();

        assert_eq!(json["tool"], "outfall");
        assert_eq!(json["generated_at"], "2024-03-01T12:00:00Z");
        assert_eq!(json["histogram_bins"].as_array().unwrap().len(), 12);
        assert_eq!(json["report"]["mode"], "all");
        assert_eq!(json["report"]["monte_carlo"]["parameter"], "bod5");
        assert_eq!(json["report"]["monte_carlo"]["run"]["compliance_probability"], 41.0);
        assert_eq!(json["report"]["oxygen_sag"]["status"], "completed");
        assert_eq!(json["report"]["queue"]["status"], "completed");
        assert_eq!(json["config"]["monte_carlo"]["seed"], 42);
    }

    #[test]
    fn test_write_json_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let config = Config::default();
        let report = run_assessment(&config, &ThresholdTable::default());
        let json = build_json_report(&config, &report, Utc::now());

        write_json_output(&path, &json, true).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["report"]["receptor"], "surface");
        assert_eq!(parsed["report"]["category"], "up_to_625");
    }

    #[test]
    fn test_write_json_output_bad_path() {
        let config = Config::default();
        let report = run_assessment(&config, &ThresholdTable::default());
        let json = build_json_report(&config, &report, Utc::now());
        assert!(write_json_output(Path::new("/nonexistent/dir/report.json"), &json, false).is_err());
    }
}
