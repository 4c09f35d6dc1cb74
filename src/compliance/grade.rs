//! Qualitative effluent grades
//!
//! Each graded parameter has an ordered list of `(upper bound, grade)`
//! breakpoints; the first bound the value does not exceed wins.

use super::{Parameter, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Outstanding,
    VeryGood,
    Good,
    Acceptable,
    Unacceptable,
    /// No numeric scale for the parameter
    NotRated,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Grade::Excellent => "excellent",
            Grade::Outstanding => "outstanding",
            Grade::VeryGood => "very good",
            Grade::Good => "good",
            Grade::Acceptable => "acceptable",
            Grade::Unacceptable => "unacceptable",
            Grade::NotRated => "not rated",
        };
        write!(f, "{}", s)
    }
}

const FIVE_STEP: [Grade; 5] = [
    Grade::Excellent,
    Grade::Outstanding,
    Grade::VeryGood,
    Grade::Good,
    Grade::Acceptable,
];

const PH_SCALE: [(f64, Grade); 5] = [
    (5.0, Grade::Unacceptable),
    (6.0, Grade::Acceptable),
    (7.0, Grade::Excellent),
    (8.0, Grade::Good),
    (9.0, Grade::Acceptable),
];

fn five_step_bounds(parameter: Parameter) -> Option<[f64; 5]> {
    match parameter {
        Parameter::Cod => Some([36.0, 72.0, 108.0, 144.0, 180.0]),
        Parameter::Bod5 | Parameter::Tss => Some([18.0, 36.0, 54.0, 72.0, 90.0]),
        Parameter::SettleableSolids => Some([1.0, 2.0, 3.0, 4.0, 5.0]),
        Parameter::FatsOils => Some([4.0, 8.0, 12.0, 16.0, 20.0]),
        _ => None,
    }
}

/// Grade of an effluent value on the parameter's scale
///
/// Values past the last breakpoint are `Unacceptable`.
pub fn scale_grade(parameter: Parameter, value: f64) -> Grade {
    if parameter == Parameter::Ph {
        return PH_SCALE
            .iter()
            .find(|(bound, _)| value <= *bound)
            .map(|(_, g)| *g)
            .unwrap_or(Grade::Unacceptable);
    }

    match five_step_bounds(parameter) {
        Some(bounds) => bounds
            .iter()
            .zip(FIVE_STEP)
            .find(|(bound, _)| value <= **bound)
            .map(|(_, g)| g)
            .unwrap_or(Grade::Unacceptable),
        None => Grade::NotRated,
    }
}

/// Final grade for a measurement
///
/// A missing value or a non-compliant verdict is always `Unacceptable`.
pub fn grade(parameter: Parameter, effluent: Option<f64>, verdict: Verdict) -> Grade {
    match effluent {
        None => Grade::Unacceptable,
        Some(_) if verdict == Verdict::NonCompliant => Grade::Unacceptable,
        Some(v) => scale_grade(parameter, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cod_scale() {
        assert_eq!(scale_grade(Parameter::Cod, 10.0), Grade::Excellent);
        assert_eq!(scale_grade(Parameter::Cod, 36.0), Grade::Excellent);
        assert_eq!(scale_grade(Parameter::Cod, 36.1), Grade::Outstanding);
        assert_eq!(scale_grade(Parameter::Cod, 100.0), Grade::VeryGood);
        assert_eq!(scale_grade(Parameter::Cod, 144.0), Grade::Good);
        assert_eq!(scale_grade(Parameter::Cod, 180.0), Grade::Acceptable);
        assert_eq!(scale_grade(Parameter::Cod, 181.0), Grade::Unacceptable);
    }

    #[test]
    fn test_ph_scale() {
        assert_eq!(scale_grade(Parameter::Ph, 4.0), Grade::Unacceptable);
        assert_eq!(scale_grade(Parameter::Ph, 5.5), Grade::Acceptable);
        assert_eq!(scale_grade(Parameter::Ph, 7.0), Grade::Excellent);
        assert_eq!(scale_grade(Parameter::Ph, 7.5), Grade::Good);
        assert_eq!(scale_grade(Parameter::Ph, 9.0), Grade::Acceptable);
        assert_eq!(scale_grade(Parameter::Ph, 9.5), Grade::Unacceptable);
    }

    #[test]
    fn test_unscaled_parameters() {
        assert_eq!(scale_grade(Parameter::Temperature, 25.0), Grade::NotRated);
        assert_eq!(scale_grade(Parameter::ThermotolerantColiforms, 1e4), Grade::NotRated);
    }

    #[test]
    fn test_verdict_and_missing_override() {
        assert_eq!(grade(Parameter::Bod5, None, Verdict::NonCompliant), Grade::Unacceptable);
        assert_eq!(grade(Parameter::Temperature, None, Verdict::NonCompliant), Grade::Unacceptable);
        assert_eq!(grade(Parameter::Bod5, Some(10.0), Verdict::NonCompliant), Grade::Unacceptable);
        assert_eq!(grade(Parameter::Bod5, Some(10.0), Verdict::Compliant), Grade::Excellent);
    }
}
