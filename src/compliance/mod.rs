//! Discharge compliance
//!
//! A regulated [`Parameter`] is checked against the [`ThresholdRule`] that
//! applies for a receptor and load category. Rules come from a
//! [`thresholds::ThresholdTable`] that is loaded once and passed in; nothing
//! here reads ambient state.

pub mod grade;
pub mod thresholds;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use grade::Grade;
pub use thresholds::ThresholdTable;

/// Relative deviation above which a non-compliance is `Deficient`
pub const SEVERITY_DEVIATION: f64 = 0.2;

/// Regulated effluent parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Temperature,
    Cod,
    Bod5,
    Tss,
    SettleableSolids,
    FatsOils,
    ThermotolerantColiforms,
}

impl Parameter {
    pub const ALL: [Parameter; 8] = [
        Parameter::Ph,
        Parameter::Temperature,
        Parameter::Cod,
        Parameter::Bod5,
        Parameter::Tss,
        Parameter::SettleableSolids,
        Parameter::FatsOils,
        Parameter::ThermotolerantColiforms,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Parameter::Ph => "ph",
            Parameter::Temperature => "temperature",
            Parameter::Cod => "cod",
            Parameter::Bod5 => "bod5",
            Parameter::Tss => "tss",
            Parameter::SettleableSolids => "settleable_solids",
            Parameter::FatsOils => "fats_oils",
            Parameter::ThermotolerantColiforms => "thermotolerant_coliforms",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Ph => "",
            Parameter::Temperature => "°C",
            Parameter::SettleableSolids => "mL/L",
            Parameter::ThermotolerantColiforms => "NMP/100mL",
            _ => "mg/L",
        }
    }

    /// Parameters measured as a single value, for which removal makes no sense
    pub fn is_single_value(&self) -> bool {
        matches!(self, Parameter::Ph | Parameter::Temperature)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Parameter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| p.id() == key)
            .ok_or_else(|| anyhow::anyhow!("Unknown parameter: {}", s))
    }
}

/// Where the effluent is discharged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Receptor {
    /// Surface water body
    #[default]
    Surface,
    /// Municipal sewer system
    Sewer,
}

impl fmt::Display for Receptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Receptor::Surface => write!(f, "surface"),
            Receptor::Sewer => write!(f, "sewer"),
        }
    }
}

/// Organic load category of the discharger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum LoadCategory {
    #[serde(rename = "individual_solution")]
    #[value(name = "individual-solution")]
    IndividualSolution,
    #[default]
    #[serde(rename = "up_to_625")]
    #[value(name = "up-to-625")]
    UpTo625,
    #[serde(rename = "from_625_to_3000")]
    #[value(name = "from-625-to-3000")]
    From625To3000,
    #[serde(rename = "above_3000")]
    #[value(name = "above-3000")]
    Above3000,
}

impl fmt::Display for LoadCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            LoadCategory::IndividualSolution => "individual_solution",
            LoadCategory::UpTo625 => "up_to_625",
            LoadCategory::From625To3000 => "from_625_to_3000",
            LoadCategory::Above3000 => "above_3000",
        };
        write!(f, "{}", s)
    }
}

/// Limit descriptor for one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Inclusive band
    Range { min: f64, max: f64 },
    /// Inclusive ceiling
    Max { limit: f64 },
    /// Measured and reported, no numeric limit
    AnalysisOnly,
}

impl ThresholdRule {
    /// Ceiling usable for a compliance probability
    pub fn ceiling(&self) -> Option<f64> {
        match self {
            ThresholdRule::Max { limit } => Some(*limit),
            _ => None,
        }
    }
}

impl fmt::Display for ThresholdRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ThresholdRule::Range { min, max } => write!(f, "{} - {}", min, max),
            ThresholdRule::Max { limit } => write!(f, "<= {}", limit),
            ThresholdRule::AnalysisOnly => write!(f, "analysis/report"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Compliant,
    NonCompliant,
    NotApplicable,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Compliant => write!(f, "compliant"),
            Verdict::NonCompliant => write!(f, "non-compliant"),
            Verdict::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// Severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Acceptable,
    /// Out of limits by at most 20 %
    Insufficient,
    /// Out of limits by more than 20 %
    Deficient,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Acceptable => write!(f, "acceptable"),
            Severity::Insufficient => write!(f, "insufficient"),
            Severity::Deficient => write!(f, "deficient"),
        }
    }
}

/// Verdict for one value against one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rule: ThresholdRule,
    pub verdict: Verdict,
    pub severity: Severity,
    /// (1 - S/E) * 100, when defined
    pub removal_efficiency_pct: Option<f64>,
    pub observations: Vec<String>,
}

/// One measured influent/effluent pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub parameter: Parameter,
    #[serde(default)]
    pub influent: Option<f64>,
    #[serde(default)]
    pub effluent: Option<f64>,
}

/// A measurement with its evaluation and grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub measurement: Measurement,
    pub evaluation: Evaluation,
    pub grade: Grade,
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Removal efficiency in percent
///
/// Defined only when both values are present and the influent is positive.
pub fn removal_efficiency(influent: Option<f64>, effluent: Option<f64>) -> Option<f64> {
    match (finite(influent), finite(effluent)) {
        (Some(e), Some(s)) if e > 0.0 => Some((1.0 - s / e) * 100.0),
        _ => None,
    }
}

/// Check an effluent value against a rule
///
/// A missing or non-finite effluent is non-compliant under any numeric rule.
pub fn evaluate(rule: &ThresholdRule, influent: Option<f64>, effluent: Option<f64>) -> Evaluation {
    let s = finite(effluent);
    let mut observations = Vec::new();

    let (verdict, deviation) = match (*rule, s) {
        (ThresholdRule::AnalysisOnly, _) => {
            observations.push("analysis and report only".to_string());
            (Verdict::NotApplicable, 0.0)
        }
        (_, None) => {
            observations.push("missing effluent value".to_string());
            (Verdict::NonCompliant, 0.0)
        }
        (ThresholdRule::Range { min, max }, Some(s)) => {
            if s < min {
                observations.push(format!("S ({}) < min ({})", s, min));
                (Verdict::NonCompliant, (min - s) / min.abs().max(1.0))
            } else if s > max {
                observations.push(format!("S ({}) > max ({})", s, max));
                (Verdict::NonCompliant, (s - max) / max.abs().max(1.0))
            } else {
                (Verdict::Compliant, 0.0)
            }
        }
        (ThresholdRule::Max { limit }, Some(s)) => {
            if s <= limit {
                (Verdict::Compliant, 0.0)
            } else {
                observations.push(format!("S ({}) > limit ({})", s, limit));
                // A zero limit has no relative scale
                let deviation = if limit > 0.0 { (s - limit) / limit } else { 0.0 };
                (Verdict::NonCompliant, deviation)
            }
        }
    };

    let severity = match verdict {
        Verdict::NonCompliant if deviation > SEVERITY_DEVIATION => Severity::Deficient,
        Verdict::NonCompliant => Severity::Insufficient,
        _ => Severity::Acceptable,
    };

    Evaluation {
        rule: *rule,
        verdict,
        severity,
        removal_efficiency_pct: removal_efficiency(influent, effluent),
        observations,
    }
}

/// Evaluate and grade a measurement row
pub fn evaluate_measurement(
    table: &ThresholdTable,
    receptor: Receptor,
    category: LoadCategory,
    measurement: &Measurement,
) -> MeasurementResult {
    let rule = table.lookup(measurement.parameter, receptor, category);
    let mut evaluation = evaluate(&rule, measurement.influent, measurement.effluent);
    if measurement.parameter.is_single_value() {
        evaluation.removal_efficiency_pct = None;
    }
    let grade = grade::grade(measurement.parameter, finite(measurement.effluent), evaluation.verdict);

    MeasurementResult {
        measurement: measurement.clone(),
        evaluation,
        grade,
    }
}
