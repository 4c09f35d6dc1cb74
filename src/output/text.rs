//! Human-readable text output

use crate::assessment::{AssessmentReport, LoadSource, Stage};
use crate::compliance::Verdict;
use crate::config::Config;
use crate::util::format::{format_pct, format_value, with_unit};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Print the assessment to stdout
pub fn print_report(report: &AssessmentReport, config: &Config) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report, config)
}

fn write_stage_header<W: Write, T>(out: &mut W, title: &str, stage: &Stage<T>) -> io::Result<bool> {
    writeln!(out, "{}:", title)?;
    match stage {
        Stage::Completed(_) => Ok(true),
        Stage::Refused(reason) => {
            writeln!(out, "  REFUSED: {}", reason)?;
            writeln!(out)?;
            Ok(false)
        }
        Stage::NotApplicable(reason) => {
            writeln!(out, "  Not applicable: {}", reason)?;
            writeln!(out)?;
            Ok(false)
        }
    }
}

/// Render the assessment
///
/// Sections appear only for the stages that ran.
pub fn write_report<W: Write>(out: &mut W, report: &AssessmentReport, config: &Config) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "                 DISCHARGE ASSESSMENT")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;
    writeln!(out, "Receptor: {}   Category: {}", report.receptor, report.category)?;
    writeln!(out)?;

    if let Some(mc) = &report.monte_carlo {
        let run = &mc.run;
        let unit = mc.parameter.unit();
        writeln!(out, "Monte Carlo ({}):", mc.parameter)?;
        writeln!(out, "  Samples:     {} (seed {})", run.samples.len(), run.seed)?;
        writeln!(out, "  Influent:    {}", config.monte_carlo.influent)?;
        writeln!(
            out,
            "  Removal:     triangular {}/{}/{} %",
            config.monte_carlo.removal.min, config.monte_carlo.removal.mode, config.monte_carlo.removal.max
        )?;
        writeln!(out, "  Limit:       {}", mc.rule)?;
        writeln!(out, "  Effluent:")?;
        writeln!(out, "    Mean:  {}", with_unit(format_value(Some(run.effluent.mean), 2), unit))?;
        writeln!(out, "    P50:   {}", with_unit(format_value(Some(run.p50()), 2), unit))?;
        writeln!(out, "    P90:   {}", with_unit(format_value(Some(run.p90()), 2), unit))?;
        writeln!(out, "    P95:   {}", with_unit(format_value(Some(run.p95()), 2), unit))?;
        writeln!(out, "  Compliance probability: {}", format_pct(run.compliance_probability))?;
        writeln!(out)?;

        writeln!(out, "  Histogram:")?;
        let peak = run.histogram.counts().iter().copied().max().unwrap_or(0).max(1);
        for bin in run.histogram.bins() {
            let bar = "█".repeat((bin.count * 30 / peak) as usize);
            writeln!(out, "    {:>10.2} - {:>10.2} {:>5} {}", bin.lower, bin.upper, bin.count, bar)?;
        }
        writeln!(out)?;

        if config.output.show_rows {
            writeln!(out, "  {:>5} {:>12} {:>10} {:>12}", "#", "influent", "removal%", "effluent")?;
            for (i, s) in run.samples.iter().enumerate() {
                writeln!(out, "  {:>5} {:>12.3} {:>10.2} {:>12.3}", i + 1, s.influent, s.removal_pct, s.effluent)?;
            }
            writeln!(out)?;
        }
    }

    if let Some(sweep) = &report.sweep {
        writeln!(out, "Seed sweep:")?;
        writeln!(out, "  {:>12} {:>10} {:>10} {:>10} {:>10}", "seed", "P50", "P90", "P95", "comply")?;
        for e in sweep {
            writeln!(
                out,
                "  {:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                e.seed,
                e.p50,
                e.p90,
                e.p95,
                format_pct(e.compliance_probability)
            )?;
        }
        writeln!(out)?;
    }

    if let Some(stage) = &report.oxygen_sag {
        if write_stage_header(out, "Oxygen sag (Streeter-Phelps)", stage)? {
            if let Some(sag) = stage.completed() {
                let source = match sag.load_source {
                    LoadSource::Configured => "configured",
                    LoadSource::SimulatedP95 => "simulated P95",
                };
                let mix = &sag.profile.mix;
                writeln!(out, "  Discharge BOD: {:.2} mg/L ({})", sag.discharge_bod, source)?;
                writeln!(
                    out,
                    "  Mix:           Q={:.3} m³/s  DO={:.3} mg/L  L0={:.3} mg/L  D0={:.3} mg/L",
                    mix.flow, mix.dissolved_oxygen, mix.bod, mix.deficit
                )?;
                let c = &sag.profile.critical;
                writeln!(
                    out,
                    "  Critical:      {:.0} km, DO {:.3} mg/L (deficit {:.3})",
                    c.distance_km, c.dissolved_oxygen, c.deficit
                )?;
                if config.output.show_rows {
                    for p in &sag.profile.points {
                        writeln!(out, "    {:>5.0} km  {:>8.3} mg/L", p.distance_km, p.dissolved_oxygen)?;
                    }
                }
                writeln!(out)?;
            }
        }
    }

    if let Some(stage) = &report.queue {
        if write_stage_header(out, "Queue", stage)? {
            if let Some(q) = stage.completed() {
                let m = &q.metrics;
                writeln!(out, "  Entities: {}   Servers: {}", q.rows.len(), q.servers)?;
                writeln!(out, "  Mean wait:        {:.3}", m.mean_wait)?;
                writeln!(out, "  Mean service:     {:.3}", m.mean_service)?;
                writeln!(out, "  Mean system time: {:.3}", m.mean_system_time)?;
                writeln!(out, "  Waited:           {:.1}%", m.waited_pct)?;
                writeln!(out, "  Makespan:         {:.3}", m.makespan)?;
                for (i, u) in m.utilization.iter().enumerate() {
                    writeln!(out, "  Server {} utilization: {:.1}%", i + 1, u)?;
                }
                if config.output.show_rows {
                    writeln!(
                        out,
                        "  {:>4} {:>3} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
                        "id", "srv", "arrival", "start", "service", "complete", "wait", "system"
                    )?;
                    for r in &q.rows {
                        writeln!(
                            out,
                            "  {:>4} {:>3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3}",
                            r.id, r.server, r.arrival, r.start, r.service, r.completion, r.wait, r.system_time
                        )?;
                    }
                }
                writeln!(out)?;
            }
        }
    }

    if let Some(stage) = &report.events {
        if write_stage_header(out, "Events", stage)? {
            if let Some(ev) = stage.completed() {
                writeln!(out, "  Draws:       {}", ev.rows.len())?;
                writeln!(out, "  Mean result: {}", format_value(ev.mean_result, 3))?;
                writeln!(out, "  Failed rows: {}", ev.failed_rows)?;
                for h in &ev.hits {
                    writeln!(out, "  {:<16} {}", h.event, h.count)?;
                }
                if config.output.show_rows {
                    for r in &ev.rows {
                        writeln!(
                            out,
                            "    {:>4} {:<16} u={:.4} -> {}{}",
                            r.index,
                            r.event,
                            r.draw,
                            format_value(Some(r.result), 3),
                            r.error.as_ref().map(|e| format!(" ({})", e)).unwrap_or_default()
                        )?;
                    }
                }
                writeln!(out)?;
            }
        }
    }

    if let Some(rows) = &report.measurements {
        writeln!(out, "Measurements:")?;
        if rows.is_empty() {
            writeln!(out, "  none")?;
        }
        for r in rows {
            let p = r.measurement.parameter;
            let mark = match r.evaluation.verdict {
                Verdict::Compliant => "OK ",
                Verdict::NonCompliant => "FAIL",
                Verdict::NotApplicable => "A/R",
            };
            writeln!(
                out,
                "  [{:<4}] {:<25} E={:<10} S={:<10} RP={:<8} limit {}  grade: {}  severity: {}",
                mark,
                p.to_string(),
                format_value(r.measurement.influent, 2),
                format_value(r.measurement.effluent, 2),
                format_pct(r.evaluation.removal_efficiency_pct),
                r.evaluation.rule,
                r.grade,
                r.evaluation.severity
            )?;
            for obs in &r.evaluation.observations {
                writeln!(out, "         {}", obs)?;
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", RULE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::run_assessment;
    use crate::compliance::{Measurement, Parameter, ThresholdTable};
    use crate::config::{RiverConfig, RunMode};

    fn render(config: &Config) -> String {
        let report = run_assessment(config, &ThresholdTable::default());
        let mut buf = Vec::new();
        write_report(&mut buf, &report, config).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_full_report_sections() {
        let text = render(&Config::default());
        assert!(text.contains("Monte Carlo (bod5):"));
        assert!(text.contains("Compliance probability: 41.0%"));
        assert!(text.contains("Oxygen sag (Streeter-Phelps):"));
        assert!(text.contains("(simulated P95)"));
        assert!(text.contains("Queue:"));
        assert!(text.contains("Events:"));
        assert!(text.contains("Measurements:"));
    }

    #[test]
    fn test_refused_stage_is_reported() {
        let config = Config {
            river: RiverConfig {
                velocity: -1.0,
                ..RiverConfig::default()
            },
            ..Config::default()
        };
        let text = render(&config);
        assert!(text.contains("REFUSED: stream velocity must be greater than zero"));
    }

    #[test]
    fn test_measurement_lines() {
        let mut config = Config::default();
        config.runtime.mode = RunMode::Compliance;
        config.measurements = vec![Measurement {
            parameter: Parameter::Bod5,
            influent: Some(300.0),
            effluent: Some(120.0),
        }];
        let text = render(&config);
        assert!(!text.contains("Monte Carlo"));
        assert!(text.contains("[FAIL]"));
        assert!(text.contains("RP=60.0%"));
        assert!(text.contains("S (120) > limit (90)"));
        assert!(text.contains("severity: deficient"));
    }
}
