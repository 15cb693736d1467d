// src/pipeline/batch.rs
//! Parallel batch conversion
//!
//! Trials are prepared in parallel, then every (trial, segment) unit is
//! converted on the rayon pool. Results meet at a single merge point where
//! records are ordered deterministically and step indices are assigned per
//! (subject, task_id). A failing unit never stops its siblings.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::converter::{PreparedTrial, SegmentOutput, StrideConverter};
use super::record::CanonicalStrideRecord;
use crate::config::PipelineConfig;
use crate::error::{Disposition, GaitError, GaitResult};
use crate::trial::RawTrial;

/// A unit of work that was skipped, degraded or filled
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub subject: String,
    pub trial: String,
    /// Segment index, `None` for trial-level failures
    pub segment: Option<usize>,
    pub disposition: Disposition,
    pub message: String,
    #[serde(skip)]
    pub error: GaitError,
}

impl UnitFailure {
    fn new(trial: &RawTrial, segment: Option<usize>, error: GaitError) -> Self {
        Self {
            subject: trial.info.subject.clone(),
            trial: trial.info.trial.clone(),
            segment,
            disposition: error.disposition(),
            message: error.to_string(),
            error,
        }
    }
}

/// Merged output of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub records: Vec<CanonicalStrideRecord>,
    pub failures: Vec<UnitFailure>,
}

impl BatchOutput {
    /// Failures with the given disposition
    pub fn failures_with(&self, disposition: Disposition) -> impl Iterator<Item = &UnitFailure> {
        self.failures.iter().filter(move |f| f.disposition == disposition)
    }

    pub fn summary(&self) -> BatchSummary {
        let mut by_disposition: HashMap<String, usize> = HashMap::new();
        for failure in &self.failures {
            *by_disposition.entry(format!("{:?}", failure.disposition)).or_default() += 1;
        }
        BatchSummary {
            records: self.records.len(),
            failures: self.failures.len(),
            by_disposition,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub records: usize,
    pub failures: usize,
    pub by_disposition: HashMap<String, usize>,
}

pub struct BatchConverter {
    config: PipelineConfig,
}

impl BatchConverter {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert all trials, one rayon task per trial segment
    pub fn convert(&self, trials: &[RawTrial]) -> BatchOutput {
        let started = Instant::now();
        let converter = StrideConverter::new(&self.config);

        let prepared: Vec<(&RawTrial, GaitResult<PreparedTrial<'_>>)> =
            trials.par_iter().map(|trial| (trial, converter.prepare(trial))).collect();

        let mut failures = Vec::new();
        let mut units = Vec::new();
        for (trial, result) in &prepared {
            match result {
                Ok(p) => {
                    failures.extend(p.issues.iter().cloned().map(|e| UnitFailure::new(trial, None, e)));
                    units.extend(p.segments.iter().map(|segment| (p, segment)));
                }
                Err(err) => {
                    warn!(trial = %trial.id(), error = %err, "trial aborted");
                    failures.push(UnitFailure::new(trial, None, err.clone()));
                }
            }
        }

        let results: Vec<(&PreparedTrial<'_>, usize, GaitResult<SegmentOutput>)> = units
            .par_iter()
            .map(|(p, segment)| (*p, segment.index, converter.convert_segment(p, segment)))
            .collect();

        // single merge point
        let mut records = Vec::new();
        for (p, segment, result) in results {
            match result {
                Ok(out) => {
                    records.extend(out.records);
                    failures.extend(out.issues.into_iter().map(|e| UnitFailure::new(p.trial, Some(segment), e)));
                }
                Err(err) => {
                    warn!(trial = %p.trial.id(), segment, error = %err, "segment skipped");
                    failures.push(UnitFailure::new(p.trial, Some(segment), err));
                }
            }
        }

        let records = assign_steps(records);
        info!(
            trials = trials.len(),
            records = records.len(),
            failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch converted"
        );
        BatchOutput { records, failures }
    }
}

/// Sort records and number them per (subject, task_id) from zero
pub fn assign_steps(mut records: Vec<CanonicalStrideRecord>) -> Vec<CanonicalStrideRecord> {
    records.sort_by(|a, b| {
        (a.subject(), a.task_id(), a.trial(), a.segment())
            .cmp(&(b.subject(), b.task_id(), b.trial(), b.segment()))
            .then(a.start_time().total_cmp(&b.start_time()))
    });

    let mut counters: HashMap<(String, String), usize> = HashMap::new();
    records
        .into_iter()
        .map(|record| {
            let counter = counters
                .entry((record.subject().to_string(), record.task_id().to_string()))
                .or_default();
            let step = *counter;
            *counter += 1;
            record.with_step(step)
        })
        .collect()
}
