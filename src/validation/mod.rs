// src/validation/mod.rs
//! Record invariant checks and the fresh-versus-stored regression oracle

pub mod comparator;

pub use comparator::{Comparator, ComparisonQuery, StrideComparison, ValidationReport};

use std::fmt;

use serde::Serialize;

use crate::config::constants::{cop, phase};
use crate::config::PipelineConfig;
use crate::pipeline::CanonicalStrideRecord;
use crate::trial::Role;

pub trait Validator<T> {
    type Error;
    fn validate(&self, input: &T) -> Result<(), Self::Error>;
}

/// Which invariant a record broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordCheck {
    PhaseGrid,
    PhaseRate,
    SignalLength,
    SegmentIdentity,
    CopContact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordViolation {
    pub check: RecordCheck,
    pub detail: String,
}

impl RecordViolation {
    fn new(check: RecordCheck, detail: String) -> Self {
        Self { check, detail }
    }
}

impl fmt::Display for RecordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.check, self.detail)
    }
}

/// Checks the structural invariants every canonical record must satisfy
///
/// - 150 strictly increasing phase values from 0 to 100
/// - `phase_rate * duration == 100` within tolerance
/// - every signal has one value per phase sample
/// - thigh/shank/foot angles equal their chain sums
/// - COP is exactly zero where vertical GRF is below the contact threshold
#[derive(Debug, Clone)]
pub struct RecordValidator {
    rate_tolerance: f64,
    contact_threshold_bw: f64,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self {
            rate_tolerance: phase::RATE_TOLERANCE,
            contact_threshold_bw: cop::CONTACT_THRESHOLD_BW,
        }
    }
}

impl RecordValidator {
    pub fn new(contact_threshold_bw: f64) -> Self {
        Self {
            contact_threshold_bw,
            ..Default::default()
        }
    }

    /// Validator matching the contact threshold the pipeline ran with
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.cop.contact_threshold_bw)
    }

    fn check_phase(&self, record: &CanonicalStrideRecord, out: &mut Vec<RecordViolation>) {
        let grid = record.phase();
        if grid.len() != phase::NUM_POINTS {
            out.push(RecordViolation::new(
                RecordCheck::PhaseGrid,
                format!("{} phase samples, expected {}", grid.len(), phase::NUM_POINTS),
            ));
            return;
        }
        if grid[0] != phase::START_PERCENT || grid[grid.len() - 1] != phase::END_PERCENT {
            out.push(RecordViolation::new(
                RecordCheck::PhaseGrid,
                format!("phase spans [{}, {}]", grid[0], grid[grid.len() - 1]),
            ));
        }
        if let Some(i) = grid.windows(2).into_iter().position(|w| w[1] <= w[0]) {
            out.push(RecordViolation::new(
                RecordCheck::PhaseGrid,
                format!("phase not increasing at index {}", i + 1),
            ));
        }

        let product = record.phase_rate() * record.duration();
        if (product - 100.0).abs() > self.rate_tolerance {
            out.push(RecordViolation::new(
                RecordCheck::PhaseRate,
                format!("phase_rate * duration = {}", product),
            ));
        }
    }

    fn check_lengths(&self, record: &CanonicalStrideRecord, out: &mut Vec<RecordViolation>) {
        let n = record.phase().len();
        for (name, signal) in record.signals() {
            if signal.len() != n {
                out.push(RecordViolation::new(
                    RecordCheck::SignalLength,
                    format!("'{}' has {} samples, expected {}", name, signal.len(), n),
                ));
            }
        }
    }

    fn check_identities(&self, record: &CanonicalStrideRecord, out: &mut Vec<RecordViolation>) {
        let Some(pelvis) = record.signal("pelvis_angle") else {
            return;
        };
        for role in Role::BOTH {
            let angle = |name: &str| record.signal(&format!("{}_angle_{}", name, role));
            let links = [
                ("thigh", Some(pelvis), "hip_flexion"),
                ("shank", angle("thigh"), "knee_flexion"),
                ("foot", angle("shank"), "ankle_dorsiflexion"),
            ];
            for (segment, parent, joint) in links {
                let (Some(parent), Some(joint), Some(value)) = (parent, angle(joint), angle(segment)) else {
                    continue;
                };
                let broken = parent
                    .iter()
                    .zip(joint)
                    .zip(value)
                    .position(|((p, j), v)| (p + j).is_finite() && p + j != *v);
                if let Some(i) = broken {
                    out.push(RecordViolation::new(
                        RecordCheck::SegmentIdentity,
                        format!("{}_angle_{} differs from its chain sum at index {}", segment, role, i),
                    ));
                }
            }
        }
    }

    fn check_cop(&self, record: &CanonicalStrideRecord, out: &mut Vec<RecordViolation>) {
        for role in Role::BOTH {
            let Some(vertical) = record.signal(&format!("grf_vertical_{}", role)) else {
                continue;
            };
            for component in ["anterior", "vertical", "lateral"] {
                let Some(cop) = record.signal(&format!("cop_{}_{}", component, role)) else {
                    continue;
                };
                let leaked = vertical
                    .iter()
                    .zip(cop)
                    .position(|(&f, &c)| f < self.contact_threshold_bw && c != 0.0);
                if let Some(i) = leaked {
                    out.push(RecordViolation::new(
                        RecordCheck::CopContact,
                        format!("cop_{}_{} is {} below contact at index {}", component, role, cop[i], i),
                    ));
                }
            }
        }
    }
}

impl Validator<CanonicalStrideRecord> for RecordValidator {
    type Error = Vec<RecordViolation>;

    fn validate(&self, record: &CanonicalStrideRecord) -> Result<(), Self::Error> {
        let mut violations = Vec::new();
        self.check_phase(record, &mut violations);
        self.check_lengths(record, &mut violations);
        self.check_identities(record, &mut violations);
        self.check_cop(record, &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StrideConverter;
    use crate::simulation::{SimulationConfig, TrialGenerator};

    fn records_with(config: &PipelineConfig) -> Vec<CanonicalStrideRecord> {
        let trial = TrialGenerator::new(SimulationConfig::default()).generate().unwrap();
        StrideConverter::new(config).convert_trial(&trial).unwrap().records
    }

    fn records() -> Vec<CanonicalStrideRecord> {
        records_with(&PipelineConfig::default())
    }

    #[test]
    fn test_pipeline_records_pass() {
        let validator = RecordValidator::default();
        let records = records();
        assert!(!records.is_empty());
        for record in &records {
            assert_eq!(validator.validate(record), Ok(()));
        }
    }

    #[test]
    fn test_threshold_above_peak_load_flags_cop() {
        let validator = RecordValidator::new(5.0);
        let records = records();
        let violations = validator.validate(&records[0]).unwrap_err();
        assert!(violations.iter().all(|v| v.check == RecordCheck::CopContact));
    }

    #[test]
    fn test_configured_contact_threshold_is_honoured() {
        let mut config = PipelineConfig::default();
        config.cop.contact_threshold_bw = 0.1;
        let records = records_with(&config);
        assert!(!records.is_empty());

        let validator = RecordValidator::from_config(&config);
        for record in &records {
            assert_eq!(validator.validate(record), Ok(()));
        }
        assert!(RecordValidator::default().validate(&records[0]).is_err());
    }
}
