//! Regulatory threshold table
//!
//! The built-in table carries the national discharge limits. A replacement
//! can be loaded from TOML:
//!
//! ```toml
//! [[surface]]
//! parameter = "cod"
//! category = "up_to_625"
//! rule = { kind = "max", limit = 180.0 }
//!
//! [[sewer]]
//! parameter = "ph"
//! rule = { kind = "range", min = 5.0, max = 9.0 }
//! ```
//!
//! An entry without `category` applies to every load category. Parameters
//! with no entry are analysis-only.

use super::{LoadCategory, Parameter, Receptor, ThresholdRule};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sewer COD limit relative to the surface limit
const SEWER_COD_FACTOR: f64 = 1.5;

/// One limit in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub parameter: Parameter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<LoadCategory>,
    pub rule: ThresholdRule,
}

impl ThresholdEntry {
    fn matches(&self, parameter: Parameter, category: LoadCategory) -> bool {
        self.parameter == parameter && self.category.map_or(true, |c| c == category)
    }
}

/// Limits per receptor
///
/// A receptor missing from a loaded file has no entries, so every parameter
/// is analysis-only there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    #[serde(default)]
    pub surface: Vec<ThresholdEntry>,
    #[serde(default)]
    pub sewer: Vec<ThresholdEntry>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let surface = surface_entries();
        let sewer = surface
            .iter()
            .map(|entry| {
                let rule = match (entry.parameter, entry.rule) {
                    (Parameter::Ph, _) => ThresholdRule::Range { min: 5.0, max: 9.0 },
                    (Parameter::Cod, ThresholdRule::Max { limit }) => ThresholdRule::Max {
                        limit: round2(limit * SEWER_COD_FACTOR),
                    },
                    (_, rule) => rule,
                };
                ThresholdEntry { rule, ..entry.clone() }
            })
            .collect();

        Self { surface, sewer }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn per_category(parameter: Parameter, limits: [f64; 4]) -> Vec<ThresholdEntry> {
    [
        LoadCategory::IndividualSolution,
        LoadCategory::UpTo625,
        LoadCategory::From625To3000,
        LoadCategory::Above3000,
    ]
    .into_iter()
    .zip(limits)
    .map(|(category, limit)| ThresholdEntry {
        parameter,
        category: Some(category),
        rule: ThresholdRule::Max { limit },
    })
    .collect()
}

fn surface_entries() -> Vec<ThresholdEntry> {
    let mut entries = vec![
        ThresholdEntry {
            parameter: Parameter::Ph,
            category: None,
            rule: ThresholdRule::Range { min: 6.0, max: 9.0 },
        },
        ThresholdEntry {
            parameter: Parameter::Temperature,
            category: None,
            rule: ThresholdRule::Max { limit: 40.0 },
        },
        ThresholdEntry {
            parameter: Parameter::ThermotolerantColiforms,
            category: None,
            rule: ThresholdRule::AnalysisOnly,
        },
    ];
    entries.extend(per_category(Parameter::Cod, [200.0, 180.0, 180.0, 150.0]));
    entries.extend(per_category(Parameter::Bod5, [90.0, 90.0, 90.0, 70.0]));
    entries.extend(per_category(Parameter::Tss, [100.0, 90.0, 90.0, 70.0]));
    entries.extend(per_category(Parameter::SettleableSolids, [5.0, 5.0, 5.0, 5.0]));
    entries.extend(per_category(Parameter::FatsOils, [20.0, 20.0, 20.0, 10.0]));
    entries
}

impl ThresholdTable {
    /// Load a table from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read thresholds file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse thresholds file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        ::toml::from_str(contents).context("Failed to parse threshold table")
    }

    pub fn entries(&self, receptor: Receptor) -> &[ThresholdEntry] {
        match receptor {
            Receptor::Surface => &self.surface,
            Receptor::Sewer => &self.sewer,
        }
    }

    /// Rule for a parameter; analysis-only when the table has none
    pub fn lookup(&self, parameter: Parameter, receptor: Receptor, category: LoadCategory) -> ThresholdRule {
        self.entries(receptor)
            .iter()
            .find(|e| e.matches(parameter, category))
            .map(|e| e.rule)
            .unwrap_or(ThresholdRule::AnalysisOnly)
    }

    /// Ceiling for the compliance probability, if the rule is a maximum
    pub fn ceiling(&self, parameter: Parameter, receptor: Receptor, category: LoadCategory) -> Option<f64> {
        self.lookup(parameter, receptor, category).ceiling()
    }
}
