// src/pipeline/converter.rs
//! Per-segment stride conversion
//!
//! [`StrideConverter`] runs event detection, segmentation, resampling,
//! kinematics, kinetics, plate assignment, GRF/COP and sign calibration for
//! one trial segment. It holds no mutable state, so segments of one or many
//! trials can be converted concurrently.

use std::collections::HashSet;

use tracing::{debug, info, info_span, warn};

use super::record::{CanonicalStrideRecord, RecordParts};
use crate::calibration::{self, apply_signs, EstimatorInputs, SignCalibration};
use crate::config::PipelineConfig;
use crate::error::{GaitError, GaitErrorBuilder, GaitResult};
use crate::events::{GaitEventTrack, HeelStrikeDetector};
use crate::force_plate::{check_swap, LegLoad, LoadCanonicalizer, PlateAssigner, PlateAssignment};
use crate::kinematics::KinematicCalculator;
use crate::kinetics::KineticNormalizer;
use crate::resampling::{PhaseFrame, PhaseResampler};
use crate::segmentation::{trial_segments, SpeedReference, Stride, StrideSegmenter, TrialSegment};
use crate::trial::naming::SPEED_COLUMN;
use crate::trial::{ChannelTable, LocomotionMode, RawTrial, Role, Side, SideMap, TableKind, TaskDescriptor, TrialSchema};

/// A trial that passed its schema check, with heel strikes detected
#[derive(Debug, Clone)]
pub struct PreparedTrial<'t> {
    pub trial: &'t RawTrial,
    pub tracks: SideMap<Option<GaitEventTrack>>,
    pub segments: Vec<TrialSegment>,
    /// Non-fatal problems found while preparing
    pub issues: Vec<GaitError>,
}

/// Records and skipped units of one segment
#[derive(Debug, Clone, Default)]
pub struct SegmentOutput {
    pub records: Vec<CanonicalStrideRecord>,
    pub issues: Vec<GaitError>,
}

/// GRF/COP of both roles after assignment, swap check and calibration
struct StrideLoads {
    ipsi: LegLoad,
    contra: LegLoad,
    plates: PlateAssignment,
    swapped: bool,
    calibration_ipsi: Option<SignCalibration>,
    calibration_contra: Option<SignCalibration>,
}

pub struct StrideConverter<'c> {
    config: &'c PipelineConfig,
    resampler: PhaseResampler,
}

impl<'c> StrideConverter<'c> {
    pub fn new(config: &'c PipelineConfig) -> Self {
        Self {
            config,
            resampler: PhaseResampler::new(config.resampling.method),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.config
    }

    /// Check the schema, detect heel strikes per leg and split into segments
    pub fn prepare<'t>(&self, trial: &'t RawTrial) -> GaitResult<PreparedTrial<'t>> {
        TrialSchema::for_mode(trial.info.mode).check(trial)?;

        let detector = HeelStrikeDetector::new(self.config.events.clone());
        let mut issues = Vec::new();
        let tracks = SideMap::from_fn(|side| match detector.detect(trial, side) {
            Ok(track) => Some(track),
            Err(err) => {
                debug!(trial = %trial.id(), %side, error = %err, "no event track");
                issues.push(err);
                None
            }
        });

        let segments = trial_segments(trial, &self.config.segmentation);
        debug!(trial = %trial.id(), segments = segments.len(), "trial prepared");
        Ok(PreparedTrial {
            trial,
            tracks,
            segments,
            issues,
        })
    }

    /// Convert every segment of a trial sequentially
    pub fn convert_trial(&self, trial: &RawTrial) -> GaitResult<SegmentOutput> {
        let prepared = self.prepare(trial)?;
        let mut output = SegmentOutput {
            records: Vec::new(),
            issues: prepared.issues.clone(),
        };
        for segment in &prepared.segments {
            match self.convert_segment(&prepared, segment) {
                Ok(out) => {
                    output.records.extend(out.records);
                    output.issues.extend(out.issues);
                }
                Err(err) => output.issues.push(err),
            }
        }
        Ok(output)
    }

    /// Convert the strides of one segment
    ///
    /// Errors that end the whole segment are returned; stride-level skips and
    /// filled channels are reported in [`SegmentOutput::issues`].
    pub fn convert_segment(&self, prepared: &PreparedTrial<'_>, segment: &TrialSegment) -> GaitResult<SegmentOutput> {
        let trial = prepared.trial;
        let span = info_span!("segment", subject = %trial.info.subject, trial = %trial.info.trial, segment = segment.index);
        let _guard = span.enter();

        let kinematics = trial.table(TableKind::Kinematics).ok_or_else(|| {
            GaitErrorBuilder::new("converter", "convert_segment").missing_table(TableKind::Kinematics, &trial.id())
        })?;
        let kinetics = trial.table(TableKind::Kinetics);

        let mut headers: Vec<&[f64]> = vec![kinematics.header()];
        if let Some(k) = kinetics {
            headers.push(k.header());
        }

        let segmenter = StrideSegmenter::new(self.config.segmentation.clone());
        let strides = segmenter.segment(&prepared.tracks, segment.window, &headers, self.speed_reference(trial))?;

        let task = TaskDescriptor::from_segment(&trial.info, segment.label.as_deref());
        let mut output = SegmentOutput {
            records: Vec::with_capacity(strides.strides.len()),
            issues: strides.rejected,
        };

        for stride in &strides.strides {
            match self.convert_stride(trial, segment, &task, stride, kinematics, kinetics, &mut output.issues) {
                Ok(record) => output.records.push(record),
                Err(err) => {
                    warn!(start = stride.start_time, error = %err, "stride skipped");
                    output.issues.push(err);
                }
            }
        }

        dedup_missing_channels(&mut output.issues);
        info!(
            ipsi = %strides.ipsi,
            task = %task.task_id,
            records = output.records.len(),
            skipped = output.issues.len(),
            "segment converted"
        );
        Ok(output)
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_stride(
        &self,
        trial: &RawTrial,
        segment: &TrialSegment,
        task: &TaskDescriptor,
        stride: &Stride,
        kinematics: &ChannelTable,
        kinetics: Option<&ChannelTable>,
        issues: &mut Vec<GaitError>,
    ) -> GaitResult<CanonicalStrideRecord> {
        let frame = PhaseFrame::for_stride(stride)?;
        let fill = self.config.signals.missing_signal_fill;
        let ipsi = stride.side;

        let kin = KinematicCalculator::new(self.resampler, fill).compute(&frame, kinematics);
        issues.extend(kin.missing.iter().cloned());
        let moments = KineticNormalizer::new(self.resampler, fill, trial.info.mass_kg).normalize(&frame, kinetics);
        issues.extend(moments.missing.iter().cloned());
        let loads = self.stride_loads(trial, &frame, ipsi, issues);

        let mut signals = kin.angles.named(ipsi, "angle");
        signals.extend(kin.velocities.named(ipsi, "velocity"));
        signals.extend(moments.named(ipsi));
        signals.extend(loads.ipsi.named(Role::Ipsi.as_str()));
        signals.extend(loads.contra.named(Role::Contra.as_str()));

        debug!(
            start = stride.start_time,
            end = stride.end_time,
            phase_rate = frame.phase_rate(),
            swapped = loads.swapped,
            "stride converted"
        );

        Ok(CanonicalStrideRecord::assemble(RecordParts {
            subject: trial.info.subject.clone(),
            trial: trial.info.trial.clone(),
            segment: segment.index,
            task: task.clone(),
            ipsi,
            start_time: frame.start_time(),
            end_time: frame.end_time(),
            phase_rate: frame.phase_rate(),
            phase: frame.phase().clone(),
            signals,
            plates: loads.plates,
            calibration_ipsi: loads.calibration_ipsi,
            calibration_contra: loads.calibration_contra,
            grf_swapped: loads.swapped,
        }))
    }

    /// Assign plates, compute GRF/COP, check for a swap and calibrate signs
    fn stride_loads(&self, trial: &RawTrial, frame: &PhaseFrame, ipsi: Side, issues: &mut Vec<GaitError>) -> StrideLoads {
        let fill = self.config.signals.missing_signal_fill;
        let unresolved = |plates: PlateAssignment| StrideLoads {
            ipsi: LegLoad::unresolved(frame.len(), fill),
            contra: LegLoad::unresolved(frame.len(), fill),
            plates,
            swapped: false,
            calibration_ipsi: None,
            calibration_contra: None,
        };

        let Some(plates) = trial.table(TableKind::ForcePlates) else {
            if trial.info.mode != LocomotionMode::LevelGround {
                warn!("no force-plate table, GRF unresolved");
            }
            return unresolved(PlateAssignment {
                skipped: trial.info.mode == LocomotionMode::LevelGround,
                ..Default::default()
            });
        };

        let fp = &self.config.force_plate;
        let assigner = PlateAssigner::new(fp, self.resampler);
        let outcome = assigner.assign(trial.info.mode, plates, frame, ipsi);
        if outcome.assignment.skipped {
            return unresolved(outcome.assignment);
        }

        let canonicalizer = LoadCanonicalizer::new(
            self.resampler,
            fp.axes,
            self.config.events.marker_axes,
            &self.config.cop,
            trial.info.mass_kg,
            fill,
        );
        let markers = trial.table(TableKind::Markers);
        let compute = |assignment: &PlateAssignment, issues: &mut Vec<GaitError>| {
            let (ipsi_load, missing_ipsi) =
                canonicalizer.leg_load(frame, plates, markers, assignment.get(Role::Ipsi), Role::Ipsi.side(ipsi));
            let (contra_load, missing_contra) =
                canonicalizer.leg_load(frame, plates, markers, assignment.get(Role::Contra), Role::Contra.side(ipsi));
            issues.extend(missing_ipsi);
            issues.extend(missing_contra);
            (ipsi_load, contra_load)
        };

        let mut assignment = outcome.assignment;
        let (mut ipsi_load, mut contra_load) = compute(&assignment, issues);

        let mut swapped = false;
        if fp.swap.enabled && assignment.ipsi.is_some() {
            let check = check_swap(frame.phase(), &ipsi_load.grf.vertical, &fp.swap);
            if check.swapped {
                info!(
                    early_stance_bw = ?check.early_stance_bw,
                    late_swing_bw = ?check.late_swing_bw,
                    "ipsi/contra plates swapped"
                );
                assignment = assignment.swapped();
                let (i, c) = compute(&assignment, issues);
                ipsi_load = i;
                contra_load = c;
                swapped = true;
            }
        }

        issues.extend(assigner.unresolved(trial.info.mode, &assignment, frame));

        let calibration_ipsi = self.calibrate(trial, frame, &mut ipsi_load, ipsi);
        let calibration_contra = if self.config.calibration.calibrate_contra {
            self.calibrate(trial, frame, &mut contra_load, ipsi.opposite())
        } else {
            None
        };

        StrideLoads {
            ipsi: ipsi_load,
            contra: contra_load,
            plates: assignment,
            swapped,
            calibration_ipsi,
            calibration_contra,
        }
    }

    /// Search the sign pair against the reference moment and apply it
    fn calibrate(&self, trial: &RawTrial, frame: &PhaseFrame, load: &mut LegLoad, side: Side) -> Option<SignCalibration> {
        if !self.config.calibration.enabled || load.plate.is_none() {
            return None;
        }
        let reference = calibration::reference_ankle_moment(
            &self.resampler,
            frame,
            trial.table(TableKind::InverseDynamics),
            side,
            trial.info.mass_kg,
        )?;
        let result = calibration::search(EstimatorInputs::from_load(load), &reference)?;
        apply_signs(load, result.pair);
        debug!(%side, pair = %result.pair, rmse = result.rmse, baseline = result.baseline_rmse, "signs calibrated");
        Some(result)
    }

    /// Belt speed channel for treadmill trials with a known nominal speed
    fn speed_reference<'t>(&self, trial: &'t RawTrial) -> Option<SpeedReference<'t>> {
        if trial.info.mode != LocomotionMode::Treadmill {
            return None;
        }
        let nominal_m_s = trial.info.speed_m_s?;
        let channel = trial.table(TableKind::Conditions)?.channel(SPEED_COLUMN)?;
        Some(SpeedReference { channel, nominal_m_s })
    }
}

/// Keep only the first `MissingChannel` per (table, channel)
fn dedup_missing_channels(issues: &mut Vec<GaitError>) {
    let mut seen: HashSet<(TableKind, String)> = HashSet::new();
    issues.retain(|issue| match issue {
        GaitError::MissingChannel { table, channel, .. } => seen.insert((*table, channel.clone())),
        _ => true,
    });
}
