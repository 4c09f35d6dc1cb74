//! CSV output formatting
//!
//! Each series of the assessment goes to its own file in the output
//! directory, with a header row:
//!
//! - `samples.csv`: influent, removal and effluent per Monte Carlo sample
//! - `histogram.csv`: bin edges and counts
//! - `exceedance.csv`: percent exceeded vs. effluent value
//! - `sweep.csv`: headline statistics per seed
//! - `oxygen_sag.csv`: distance, travel time, deficit and DO
//! - `queue.csv`: the queue event log
//! - `events.csv`: one row per event draw
//!
//! Series whose stage did not complete are skipped.

use crate::assessment::{AssessmentReport, SweepEntry};
use crate::simulation::events::EventRow;
use crate::simulation::monte_carlo::TreatmentSample;
use crate::simulation::oxygen_sag::SagPoint;
use crate::simulation::queue::QueueRow;
use crate::stats::exceedance::ExceedancePoint;
use crate::stats::histogram::HistogramBin;
use crate::Result;
use anyhow::Context;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSV file with a fixed header
pub struct CsvWriter {
    file: BufWriter<File>,
    columns: usize,
}

impl CsvWriter {
    /// Create the file and write the header row
    pub fn new(path: &Path, header: &[&str]) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut file = BufWriter::new(file);
        writeln!(file, "{}", header.join(","))?;
        Ok(Self {
            file,
            columns: header.len(),
        })
    }

    /// Append one row; field count must match the header
    pub fn write_row(&mut self, fields: &[String]) -> Result<()> {
        if fields.len() != self.columns {
            anyhow::bail!("CSV row has {} fields, header has {}", fields.len(), self.columns);
        }
        writeln!(self.file, "{}", fields.join(","))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// Number field; empty when not finite
fn num(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(num).unwrap_or_default()
}

/// Quote a text field if it contains separators or quotes
fn text(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn write_samples_csv(path: &Path, samples: &[TreatmentSample]) -> Result<()> {
    let mut w = CsvWriter::new(path, &["index", "influent", "removal_pct", "effluent"])?;
    for (i, s) in samples.iter().enumerate() {
        w.write_row(&[(i + 1).to_string(), num(s.influent), num(s.removal_pct), num(s.effluent)])?;
    }
    w.finish()
}

pub fn write_histogram_csv(path: &Path, bins: &[HistogramBin]) -> Result<()> {
    let mut w = CsvWriter::new(path, &["lower", "upper", "count"])?;
    for b in bins {
        w.write_row(&[num(b.lower), num(b.upper), b.count.to_string()])?;
    }
    w.finish()
}

pub fn write_exceedance_csv(path: &Path, curve: &[ExceedancePoint]) -> Result<()> {
    let mut w = CsvWriter::new(path, &["percent_exceeded", "value"])?;
    for p in curve {
        w.write_row(&[num(p.percent), num(p.value)])?;
    }
    w.finish()
}

pub fn write_sweep_csv(path: &Path, sweep: &[SweepEntry]) -> Result<()> {
    let mut w = CsvWriter::new(path, &["seed", "p50", "p90", "p95", "compliance_pct"])?;
    for e in sweep {
        w.write_row(&[
            e.seed.to_string(),
            num(e.p50),
            num(e.p90),
            num(e.p95),
            opt(e.compliance_probability),
        ])?;
    }
    w.finish()
}

pub fn write_sag_profile_csv(path: &Path, points: &[SagPoint]) -> Result<()> {
    let mut w = CsvWriter::new(path, &["distance_km", "travel_time_days", "deficit", "dissolved_oxygen"])?;
    for p in points {
        w.write_row(&[
            num(p.distance_km),
            num(p.travel_time_days),
            num(p.deficit),
            num(p.dissolved_oxygen),
        ])?;
    }
    w.finish()
}

pub fn write_queue_csv(path: &Path, rows: &[QueueRow]) -> Result<()> {
    let mut w = CsvWriter::new(
        path,
        &[
            "id",
            "server",
            "inter_arrival",
            "arrival",
            "start",
            "service",
            "completion",
            "wait",
            "system_time",
        ],
    )?;
    for r in rows {
        w.write_row(&[
            r.id.to_string(),
            r.server.to_string(),
            num(r.inter_arrival),
            num(r.arrival),
            num(r.start),
            num(r.service),
            num(r.completion),
            num(r.wait),
            num(r.system_time),
        ])?;
    }
    w.finish()
}

pub fn write_events_csv(path: &Path, rows: &[EventRow]) -> Result<()> {
    let mut w = CsvWriter::new(path, &["index", "event", "draw", "base_value", "result", "error"])?;
    for r in rows {
        w.write_row(&[
            r.index.to_string(),
            text(&r.event),
            num(r.draw),
            num(r.base_value),
            num(r.result),
            text(r.error.as_deref().unwrap_or("")),
        ])?;
    }
    w.finish()
}

/// Write every available series into `dir`, creating it if needed
///
/// Returns the files written.
pub fn write_csv_outputs(dir: &Path, report: &AssessmentReport) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create CSV directory: {}", dir.display()))?;
    let mut written = Vec::new();

    if let Some(mc) = &report.monte_carlo {
        let path = dir.join("samples.csv");
        write_samples_csv(&path, &mc.run.samples)?;
        written.push(path);

        let path = dir.join("histogram.csv");
        write_histogram_csv(&path, &mc.run.histogram.bins())?;
        written.push(path);

        let path = dir.join("exceedance.csv");
        write_exceedance_csv(&path, &mc.run.exceedance)?;
        written.push(path);
    }
    if let Some(sweep) = &report.sweep {
        let path = dir.join("sweep.csv");
        write_sweep_csv(&path, sweep)?;
        written.push(path);
    }
    if let Some(sag) = report.oxygen_sag.as_ref().and_then(|s| s.completed()) {
        let path = dir.join("oxygen_sag.csv");
        write_sag_profile_csv(&path, &sag.profile.points)?;
        written.push(path);
    }
    if let Some(queue) = report.queue.as_ref().and_then(|s| s.completed()) {
        let path = dir.join("queue.csv");
        write_queue_csv(&path, &queue.rows)?;
        written.push(path);
    }
    if let Some(events) = report.events.as_ref().and_then(|s| s.completed()) {
        let path = dir.join("events.csv");
        write_events_csv(&path, &events.rows)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::run_assessment;
    use crate::compliance::ThresholdTable;
    use crate::config::{Config, RunMode};
    use crate::simulation::events::{simulate, ProbabilityEvent};
    use crate::simulation::queue::simulate_durations;
    use tempfile::tempdir;

    #[test]
    fn test_queue_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.csv");
        let run = simulate_durations(&[2.0, 2.0, 2.0], &[5.0, 1.0, 1.0], 1);
        write_queue_csv(&path, &run.rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,server,inter_arrival,arrival,start,service,completion,wait,system_time");
        assert_eq!(lines[2], "2,1,2,4,7,1,8,3,4");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_event_csv_blanks_failed_results_and_quotes_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let events = vec![
            ProbabilityEvent::new("a, b", 0.5, 1.0).with_formula("max(1)"),
            ProbabilityEvent::new("c", 0.5, 2.0),
        ];
        let run = simulate(&events, &[0.1, 0.7]).unwrap();
        write_events_csv(&path, &run.rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("1,\"a, b\",0.1,1,,"));
        assert_eq!(lines[2], "2,c,0.7,2,2,");
    }

    #[test]
    fn test_row_width_checked() {
        let dir = tempdir().unwrap();
        let mut w = CsvWriter::new(&dir.path().join("x.csv"), &["a", "b"]).unwrap();
        assert!(w.write_row(&["1".into()]).is_err());
    }

    #[test]
    fn test_write_csv_outputs_all_series() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("series");
        let mut config = Config::default();
        config.runtime.sweep_seeds = Some(2);
        let report = run_assessment(&config, &ThresholdTable::default());

        let written = write_csv_outputs(&out, &report).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "samples.csv",
                "histogram.csv",
                "exceedance.csv",
                "sweep.csv",
                "oxygen_sag.csv",
                "queue.csv",
                "events.csv"
            ]
        );

        let samples = fs::read_to_string(out.join("samples.csv")).unwrap();
        assert_eq!(samples.lines().count(), 201);
        let sag = fs::read_to_string(out.join("oxygen_sag.csv")).unwrap();
        assert_eq!(sag.lines().count(), 32);
    }

    #[test]
    fn test_write_csv_outputs_skips_unrun_stages() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.runtime.mode = RunMode::Queue;
        let report = run_assessment(&config, &ThresholdTable::default());
        let written = write_csv_outputs(dir.path(), &report).unwrap();
        assert_eq!(written, vec![dir.path().join("queue.csv")]);
    }
}
