// src/pipeline/record.rs
//! Canonical per-stride output records

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::Serialize;

use crate::calibration::SignCalibration;
use crate::force_plate::PlateAssignment;
use crate::trial::{Role, Side, TaskDescriptor};

/// One phase-normalized stride, immutable once assembled
///
/// Signals are keyed `<signal>_<ipsi|contra>` (pelvis and trunk carry no
/// role) and every array has one value per phase sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalStrideRecord {
    subject: String,
    trial: String,
    segment: usize,
    task: String,
    task_id: String,
    task_info: String,
    step: usize,
    ipsi: Side,
    start_time: f64,
    end_time: f64,
    phase_rate: f64,
    phase: Array1<f64>,
    signals: BTreeMap<String, Array1<f64>>,
    plates: PlateAssignment,
    calibration_ipsi: Option<SignCalibration>,
    calibration_contra: Option<SignCalibration>,
    grf_swapped: bool,
}

/// Everything a record is assembled from
#[derive(Debug, Clone)]
pub(crate) struct RecordParts {
    pub subject: String,
    pub trial: String,
    pub segment: usize,
    pub task: TaskDescriptor,
    pub ipsi: Side,
    pub start_time: f64,
    pub end_time: f64,
    pub phase_rate: f64,
    pub phase: Array1<f64>,
    pub signals: Vec<(String, Array1<f64>)>,
    pub plates: PlateAssignment,
    pub calibration_ipsi: Option<SignCalibration>,
    pub calibration_contra: Option<SignCalibration>,
    pub grf_swapped: bool,
}

/// One phase sample of a record, as written by a columnar storage layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRow {
    pub subject: String,
    pub task: String,
    pub task_id: String,
    pub task_info: String,
    pub step: String,
    pub phase_index: usize,
    pub phase_percent: f64,
    pub phase_rate: f64,
    pub values: BTreeMap<String, f64>,
}

impl CanonicalStrideRecord {
    pub(crate) fn assemble(parts: RecordParts) -> Self {
        Self {
            subject: parts.subject,
            trial: parts.trial,
            segment: parts.segment,
            task: parts.task.task,
            task_id: parts.task.task_id,
            task_info: parts.task.task_info,
            step: 0,
            ipsi: parts.ipsi,
            start_time: parts.start_time,
            end_time: parts.end_time,
            phase_rate: parts.phase_rate,
            phase: parts.phase,
            signals: parts.signals.into_iter().collect(),
            plates: parts.plates,
            calibration_ipsi: parts.calibration_ipsi,
            calibration_contra: parts.calibration_contra,
            grf_swapped: parts.grf_swapped,
        }
    }

    /// Step index is assigned once at the batch merge point
    pub(crate) fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn trial(&self) -> &str {
        &self.trial
    }

    pub fn segment(&self) -> usize {
        self.segment
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_info(&self) -> &str {
        &self.task_info
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Zero-padded step label, e.g. `007`
    pub fn step_label(&self) -> String {
        format!("{:03}", self.step)
    }

    pub fn ipsi(&self) -> Side {
        self.ipsi
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn phase_rate(&self) -> f64 {
        self.phase_rate
    }

    pub fn phase(&self) -> &Array1<f64> {
        &self.phase
    }

    pub fn signal(&self, name: &str) -> Option<&Array1<f64>> {
        self.signals.get(name)
    }

    pub fn signal_names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(|k| k.as_str())
    }

    pub fn signals(&self) -> &BTreeMap<String, Array1<f64>> {
        &self.signals
    }

    pub fn plates(&self) -> &PlateAssignment {
        &self.plates
    }

    pub fn calibration(&self, role: Role) -> Option<&SignCalibration> {
        match role {
            Role::Ipsi => self.calibration_ipsi.as_ref(),
            Role::Contra => self.calibration_contra.as_ref(),
        }
    }

    pub fn grf_swapped(&self) -> bool {
        self.grf_swapped
    }

    /// Expand into one row per phase sample
    pub fn to_rows(&self) -> Vec<PhaseRow> {
        let step = self.step_label();
        self.phase
            .iter()
            .enumerate()
            .map(|(i, &phase_percent)| PhaseRow {
                subject: self.subject.clone(),
                task: self.task.clone(),
                task_id: self.task_id.clone(),
                task_info: self.task_info.clone(),
                step: step.clone(),
                phase_index: i,
                phase_percent,
                phase_rate: self.phase_rate,
                values: self
                    .signals
                    .iter()
                    .map(|(name, signal)| (name.clone(), signal.get(i).copied().unwrap_or(f64::NAN)))
                    .collect(),
            })
            .collect()
    }
}
