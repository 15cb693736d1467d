// src/validation/comparator.rs
//! Fresh recompute versus stored output
//!
//! The comparator reruns the converter on raw trials for one subject and task
//! and takes each fresh stride's calibration RMSE. For the stored records it
//! re-derives the ankle moment from the persisted (already sign-corrected)
//! COP and GRF with the unflipped pair, against the same inverse-dynamics
//! reference, and re-runs the sign search to confirm the stored signs. The
//! absolute difference of the two mean RMSEs is gated by a tolerance.

use serde::Serialize;
use tracing::{info, warn};

use crate::calibration::{self, estimate_ankle_moment, search, EstimatorInputs, SignPair};
use crate::config::PipelineConfig;
use crate::error::{GaitErrorBuilder, GaitResult};
use crate::pipeline::{CanonicalStrideRecord, StrideConverter};
use crate::resampling::{PhaseFrame, PhaseResampler};
use crate::trial::{RawTrial, Role, TableKind, TimeWindow};
use crate::utils::numeric::rmse;

/// Start times closer than this identify the same stride
const STRIDE_MATCH_S: f64 = 1e-6;

/// Which strides to compare
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonQuery {
    pub subject: String,
    pub task_id: String,
    /// Only strides lying entirely inside the window
    pub window: Option<TimeWindow>,
}

impl ComparisonQuery {
    pub fn new(subject: &str, task_id: &str) -> Self {
        Self {
            subject: subject.to_string(),
            task_id: task_id.to_string(),
            window: None,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    fn matches(&self, record: &CanonicalStrideRecord) -> bool {
        record.subject() == self.subject
            && record.task_id() == self.task_id
            && self
                .window
                .map_or(true, |w| w.contains(record.start_time()) && w.contains(record.end_time()))
    }
}

/// One stride seen by either side of the comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrideComparison {
    pub trial: String,
    pub start_time: f64,
    pub end_time: f64,
    pub fresh_rmse: Option<f64>,
    pub stored_rmse: Option<f64>,
    /// Pair the search picks on the stored signals; unflipped when consistent
    pub stored_pair: Option<SignPair>,
}

impl StrideComparison {
    pub fn sign_mismatch(&self) -> bool {
        self.stored_pair.is_some_and(|p| p != SignPair::Unflipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub query: ComparisonQuery,
    pub fresh_mean_rmse: f64,
    pub stored_mean_rmse: f64,
    pub abs_difference: f64,
    pub tolerance: f64,
    pub passed: bool,
    pub per_stride: Vec<StrideComparison>,
    pub sign_mismatches: usize,
}

impl ValidationReport {
    pub fn to_json(&self) -> GaitResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            GaitErrorBuilder::new("validation_report", "to_json").invalid_data("validation report", &e.to_string())
        })
    }

    /// A failed gate becomes [`crate::GaitError::ValidationFailed`]
    pub fn into_result(self) -> GaitResult<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(GaitErrorBuilder::new("comparator", "gate").validation_failed(
                self.fresh_mean_rmse,
                self.stored_mean_rmse,
                self.tolerance,
            ))
        }
    }
}

pub struct Comparator<'c> {
    config: &'c PipelineConfig,
    resampler: PhaseResampler,
}

impl<'c> Comparator<'c> {
    pub fn new(config: &'c PipelineConfig) -> Self {
        Self {
            config,
            resampler: PhaseResampler::new(config.resampling.method),
        }
    }

    /// Compare fresh and stored strides matching `query`
    ///
    /// Errors when either side has no stride with a finite RMSE.
    pub fn compare(
        &self,
        query: &ComparisonQuery,
        trials: &[RawTrial],
        stored: &[CanonicalStrideRecord],
    ) -> GaitResult<ValidationReport> {
        let trials: Vec<&RawTrial> = trials.iter().filter(|t| t.info.subject == query.subject).collect();

        let converter = StrideConverter::new(self.config);
        let mut per_stride: Vec<StrideComparison> = Vec::new();
        for trial in &trials {
            let output = match converter.convert_trial(trial) {
                Ok(output) => output,
                Err(err) => {
                    warn!(trial = %trial.id(), error = %err, "fresh recompute failed");
                    continue;
                }
            };
            for record in output.records.iter().filter(|r| query.matches(r)) {
                per_stride.push(StrideComparison {
                    trial: record.trial().to_string(),
                    start_time: record.start_time(),
                    end_time: record.end_time(),
                    fresh_rmse: record.calibration(Role::Ipsi).map(|c| c.rmse),
                    stored_rmse: None,
                    stored_pair: None,
                });
            }
        }

        for record in stored.iter().filter(|r| query.matches(r)) {
            let Some(trial) = trials.iter().find(|t| t.info.trial == record.trial()) else {
                warn!(trial = record.trial(), "no raw trial for stored stride");
                continue;
            };
            let (stored_rmse, stored_pair) = self.stored_fit(trial, record).unzip();
            let existing = per_stride
                .iter_mut()
                .find(|s| s.trial == record.trial() && (s.start_time - record.start_time()).abs() < STRIDE_MATCH_S);
            match existing {
                Some(entry) => {
                    entry.stored_rmse = stored_rmse;
                    entry.stored_pair = stored_pair;
                }
                None => per_stride.push(StrideComparison {
                    trial: record.trial().to_string(),
                    start_time: record.start_time(),
                    end_time: record.end_time(),
                    fresh_rmse: None,
                    stored_rmse,
                    stored_pair,
                }),
            }
        }

        let mean = |values: Vec<f64>| (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        let fresh = mean(per_stride.iter().filter_map(|s| s.fresh_rmse).filter(|v| v.is_finite()).collect());
        let stored_mean = mean(per_stride.iter().filter_map(|s| s.stored_rmse).filter(|v| v.is_finite()).collect());
        let (Some(fresh_mean_rmse), Some(stored_mean_rmse)) = (fresh, stored_mean) else {
            return Err(GaitErrorBuilder::new("comparator", "compare").invalid_data(
                "comparison",
                &format!("no comparable strides for {} / {}", query.subject, query.task_id),
            ));
        };

        let tolerance = self.config.validation.rmse_tolerance;
        let abs_difference = (fresh_mean_rmse - stored_mean_rmse).abs();
        let sign_mismatches = per_stride.iter().filter(|s| s.sign_mismatch()).count();
        let passed = abs_difference <= tolerance;

        info!(
            subject = %query.subject,
            task = %query.task_id,
            strides = per_stride.len(),
            fresh_mean_rmse,
            stored_mean_rmse,
            sign_mismatches,
            passed,
            "validation compared"
        );

        Ok(ValidationReport {
            query: query.clone(),
            fresh_mean_rmse,
            stored_mean_rmse,
            abs_difference,
            tolerance,
            passed,
            per_stride,
            sign_mismatches,
        })
    }

    /// RMSE of the stored ipsi signals with no further flips, and the pair a
    /// fresh search would choose on them
    fn stored_fit(&self, trial: &RawTrial, record: &CanonicalStrideRecord) -> Option<(f64, SignPair)> {
        let frame = PhaseFrame::new(record.start_time(), record.end_time()).ok()?;
        let reference = calibration::reference_ankle_moment(
            &self.resampler,
            &frame,
            trial.table(TableKind::InverseDynamics),
            record.ipsi(),
            trial.info.mass_kg,
        )?;
        let role = Role::Ipsi;
        let inputs = EstimatorInputs {
            cop_anterior: record.signal(&format!("cop_anterior_{}", role))?,
            cop_vertical: record.signal(&format!("cop_vertical_{}", role))?,
            grf_vertical: record.signal(&format!("grf_vertical_{}", role))?,
            grf_anterior: record.signal(&format!("grf_anterior_{}", role))?,
        };
        let stored_rmse = rmse(&estimate_ankle_moment(inputs, SignPair::Unflipped), &reference)?;
        let pair = search(inputs, &reference)?.pair;
        Some((stored_rmse, pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BatchConverter;
    use crate::simulation::{SimulationConfig, TrialGenerator};

    fn trial(signs: SignPair) -> RawTrial {
        TrialGenerator::new(SimulationConfig::default().with_true_signs(signs))
            .generate()
            .unwrap()
    }

    #[test]
    fn test_stored_output_matches_fresh_recompute() {
        let config = PipelineConfig::default();
        let trials = vec![trial(SignPair::FlipShear)];
        let stored = BatchConverter::new(config.clone()).convert(&trials).records;
        let task_id = stored[0].task_id().to_string();

        let report = Comparator::new(&config)
            .compare(&ComparisonQuery::new("SIM01", &task_id), &trials, &stored)
            .unwrap();
        assert!(report.passed);
        assert!(report.abs_difference < 1e-9);
        assert_eq!(report.sign_mismatches, 0);
        assert_eq!(report.per_stride.len(), stored.len());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_unknown_task_has_nothing_to_compare() {
        let config = PipelineConfig::default();
        let trials = vec![trial(SignPair::Unflipped)];
        let result = Comparator::new(&config).compare(&ComparisonQuery::new("SIM01", "stair_ascent_150"), &trials, &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_gate_is_validation_error() {
        let report = ValidationReport {
            query: ComparisonQuery::new("AB01", "level_walking_1.20"),
            fresh_mean_rmse: 0.05,
            stored_mean_rmse: 0.2,
            abs_difference: 0.15,
            tolerance: 0.01,
            passed: false,
            per_stride: Vec::new(),
            sign_mismatches: 0,
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"passed\": false"));
        let err = report.into_result().unwrap_err();
        assert_eq!(err.disposition(), crate::error::Disposition::Gate);
    }
}
