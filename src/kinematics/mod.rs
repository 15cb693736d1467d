// src/kinematics/mod.rs
//! Phase-normalized joint and segment kinematics

pub mod chain;

pub use chain::{ChainInputs, JointAngles, KinematicChain, LegAngles};

use std::borrow::Cow;

use ndarray::Array1;
use tracing::{debug, warn};

use crate::config::{FillPolicy, ResamplingMethod};
use crate::error::{GaitError, GaitErrorBuilder};
use crate::resampling::{PhaseFrame, PhaseResampler, SignalKind};
use crate::trial::naming::{joint_angle_column, Joint, LUMBAR_EXTENSION, PELVIS_TILT};
use crate::trial::{ChannelTable, SideMap, TableKind};

/// Angles and velocities of one stride
#[derive(Debug, Clone)]
pub struct KinematicSignals {
    pub angles: KinematicChain,
    pub velocities: KinematicChain,
    /// Absent source channels that were filled
    pub missing: Vec<GaitError>,
}

/// Resamples joint angles and derives the segment chain
pub struct KinematicCalculator {
    resampler: PhaseResampler,
    fill: FillPolicy,
}

impl KinematicCalculator {
    pub fn new(resampler: PhaseResampler, fill: FillPolicy) -> Self {
        Self { resampler, fill }
    }

    pub fn compute(&self, frame: &PhaseFrame, table: &ChannelTable) -> KinematicSignals {
        let mut missing = Vec::new();
        let source = self.source_inputs(table, &mut missing);

        let header = table.header();
        let resampled =
            source.map(|s| self.resampler.resample_series(frame, header, &to_slice(s), SignalKind::Continuous));
        let angles = KinematicChain::compute(&resampled);

        let velocities = match self.resampler.method() {
            ResamplingMethod::DirectTime => angles.map(|a| self.resampler.phase_velocity(frame, a)),
            ResamplingMethod::LegacyTwoStage => KinematicChain::compute(&source)
                .map(|s| self.resampler.source_velocity(frame, header, &to_slice(s))),
        };

        debug!(
            start = frame.start_time(),
            end = frame.end_time(),
            missing = missing.len(),
            "kinematics resampled"
        );
        KinematicSignals {
            angles,
            velocities,
            missing,
        }
    }

    /// Source-rate chain inputs, absent channels filled per policy
    fn source_inputs(&self, table: &ChannelTable, missing: &mut Vec<GaitError>) -> ChainInputs {
        let mut fetch = |name: &str| match table.column(name) {
            Some(values) => Array1::from(values.to_vec()),
            None => {
                warn!(channel = name, "kinematic channel missing, filling");
                missing.push(GaitErrorBuilder::new("kinematics", "source_inputs").missing_channel(TableKind::Kinematics, name));
                Array1::from_elem(table.len(), self.fill.value())
            }
        };

        let pelvis_tilt = fetch(PELVIS_TILT);
        let legs = SideMap::from_fn(|side| JointAngles {
            hip_flexion: fetch(&joint_angle_column(Joint::Hip, side)),
            knee_angle: fetch(&joint_angle_column(Joint::Knee, side)),
            ankle_angle: fetch(&joint_angle_column(Joint::Ankle, side)),
        });
        let lumbar_extension = table.column(LUMBAR_EXTENSION).map(|v| Array1::from(v.to_vec()));

        ChainInputs {
            pelvis_tilt,
            lumbar_extension,
            legs,
        }
    }
}

fn to_slice(a: &Array1<f64>) -> Cow<'_, [f64]> {
    match a.as_slice() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(a.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::Side;

    fn table(n: usize) -> ChannelTable {
        let header: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let mut t = ChannelTable::new(header.clone()).unwrap();
        t.insert_column(PELVIS_TILT, vec![4.0; n]).unwrap();
        t.insert_column(LUMBAR_EXTENSION, vec![-1.0; n]).unwrap();
        for side in Side::BOTH {
            t.insert_column(&joint_angle_column(Joint::Hip, side), header.iter().map(|x| 20.0 * x).collect())
                .unwrap();
            t.insert_column(&joint_angle_column(Joint::Knee, side), vec![30.0; n]).unwrap();
            t.insert_column(&joint_angle_column(Joint::Ankle, side), vec![5.0; n]).unwrap();
        }
        t
    }

    #[test]
    fn test_knee_is_negated_and_identities_hold() {
        let calc = KinematicCalculator::new(PhaseResampler::new(ResamplingMethod::DirectTime), FillPolicy::Nan);
        let frame = PhaseFrame::new(0.2, 1.4).unwrap();
        let out = calc.compute(&frame, &table(200));
        let right = &out.angles.legs.right;
        assert!(right.knee_flexion.iter().all(|&k| k == -30.0));
        for i in 0..150 {
            assert_eq!(right.thigh[i], out.angles.pelvis[i] + right.hip_flexion[i]);
            assert_eq!(right.foot[i], right.shank[i] + right.ankle_dorsiflexion[i]);
        }
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_constant_angles_have_zero_velocity() {
        for method in [ResamplingMethod::DirectTime, ResamplingMethod::LegacyTwoStage] {
            let calc = KinematicCalculator::new(PhaseResampler::new(method), FillPolicy::Nan);
            let frame = PhaseFrame::new(0.2, 1.4).unwrap();
            let out = calc.compute(&frame, &table(200));
            assert!(out.velocities.pelvis.iter().all(|v| v.abs() < 1e-9));
            assert!(out.velocities.legs.left.knee_flexion.iter().all(|v| v.abs() < 1e-9));
        }
    }

    #[test]
    fn test_missing_channel_is_filled() {
        let mut t = table(200);
        t.remove_column(&joint_angle_column(Joint::Ankle, Side::Left));
        let calc = KinematicCalculator::new(PhaseResampler::new(ResamplingMethod::DirectTime), FillPolicy::Zero);
        let out = calc.compute(&PhaseFrame::new(0.2, 1.4).unwrap(), &t);
        assert_eq!(out.missing.len(), 1);
        assert!(out.angles.legs.left.ankle_dorsiflexion.iter().all(|&a| a == 0.0));
    }
}
