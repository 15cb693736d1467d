// src/kinetics/mod.rs
//! Joint moment normalization
//!
//! Moments are resampled onto the phase grid, divided by body mass (Nm/kg)
//! and expressed in one global sign convention: the knee moment is negated
//! for every leg and task, hip and ankle pass through unchanged.

use ndarray::Array1;
use tracing::warn;

use crate::config::FillPolicy;
use crate::error::{GaitError, GaitErrorBuilder};
use crate::resampling::{PhaseFrame, PhaseResampler, SignalKind};
use crate::trial::naming::{joint_moment_column, Joint};
use crate::trial::{ChannelTable, Role, Side, SideMap, TableKind};

/// Sign applied to a joint's mass-normalized moment
pub fn moment_sign(joint: Joint) -> f64 {
    match joint {
        Joint::Knee => -1.0,
        Joint::Hip | Joint::Ankle => 1.0,
    }
}

/// Mass-normalize and sign-correct a resampled moment (N·m → Nm/kg)
pub fn normalize_moment(moment: &Array1<f64>, joint: Joint, mass_kg: f64) -> Array1<f64> {
    moment.mapv(|m| moment_sign(joint) * m / mass_kg)
}

/// Normalized moments of one leg, keyed by joint
#[derive(Debug, Clone, PartialEq)]
pub struct JointMoments {
    pub hip_flexion: Array1<f64>,
    pub knee_flexion: Array1<f64>,
    pub ankle_dorsiflexion: Array1<f64>,
}

impl JointMoments {
    pub fn get(&self, joint: Joint) -> &Array1<f64> {
        match joint {
            Joint::Hip => &self.hip_flexion,
            Joint::Knee => &self.knee_flexion,
            Joint::Ankle => &self.ankle_dorsiflexion,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KineticSignals {
    pub moments: SideMap<JointMoments>,
    pub missing: Vec<GaitError>,
}

impl KineticSignals {
    /// Output signals named `<joint>_moment_<role>`
    pub fn named(&self, ipsi: Side) -> Vec<(String, Array1<f64>)> {
        let mut out = Vec::with_capacity(6);
        for role in Role::BOTH {
            let moments = self.moments.get(role.side(ipsi));
            for joint in Joint::ALL {
                out.push((format!("{}_moment_{}", joint.canonical_name(), role), moments.get(joint).clone()));
            }
        }
        out
    }
}

pub struct KineticNormalizer {
    resampler: PhaseResampler,
    fill: FillPolicy,
    mass_kg: f64,
}

impl KineticNormalizer {
    pub fn new(resampler: PhaseResampler, fill: FillPolicy, mass_kg: f64) -> Self {
        Self {
            resampler,
            fill,
            mass_kg,
        }
    }

    /// Normalize every joint moment of both legs
    ///
    /// An absent table or column yields a 150-sample array of the fill value
    /// and a `MissingChannel` entry.
    pub fn normalize(&self, frame: &PhaseFrame, table: Option<&ChannelTable>) -> KineticSignals {
        let mut missing = Vec::new();
        let mut moment = |side: Side, joint: Joint| {
            let column = joint_moment_column(joint, side);
            match table.and_then(|t| t.channel(&column)) {
                Some(channel) => {
                    let raw = self.resampler.resample(frame, channel, SignalKind::Continuous);
                    normalize_moment(&raw, joint, self.mass_kg)
                }
                None => {
                    warn!(channel = %column, "moment channel missing, filling");
                    missing.push(
                        GaitErrorBuilder::new("kinetics", "normalize").missing_channel(TableKind::Kinetics, &column),
                    );
                    Array1::from_elem(frame.len(), self.fill.value())
                }
            }
        };

        let moments = SideMap::from_fn(|side| JointMoments {
            hip_flexion: moment(side, Joint::Hip),
            knee_flexion: moment(side, Joint::Knee),
            ankle_dorsiflexion: moment(side, Joint::Ankle),
        });

        KineticSignals { moments, missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResamplingMethod;

    fn table() -> ChannelTable {
        let n = 200;
        let header: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let mut t = ChannelTable::new(header).unwrap();
        for side in Side::BOTH {
            t.insert_column(&joint_moment_column(Joint::Hip, side), vec![70.0; n]).unwrap();
            t.insert_column(&joint_moment_column(Joint::Knee, side), vec![35.0; n]).unwrap();
            t.insert_column(&joint_moment_column(Joint::Ankle, side), vec![-140.0; n]).unwrap();
        }
        t
    }

    fn normalizer(fill: FillPolicy) -> KineticNormalizer {
        KineticNormalizer::new(PhaseResampler::new(ResamplingMethod::DirectTime), fill, 70.0)
    }

    #[test]
    fn test_mass_normalization_and_knee_sign() {
        let frame = PhaseFrame::new(0.1, 1.3).unwrap();
        let out = normalizer(FillPolicy::Nan).normalize(&frame, Some(&table()));
        let right = &out.moments.right;
        assert!(right.hip_flexion.iter().all(|&m| (m - 1.0).abs() < 1e-12));
        assert!(right.knee_flexion.iter().all(|&m| (m + 0.5).abs() < 1e-12));
        assert!(right.ankle_dorsiflexion.iter().all(|&m| (m + 2.0).abs() < 1e-12));
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_absent_table_fills_per_policy() {
        let frame = PhaseFrame::new(0.1, 1.3).unwrap();
        let out = normalizer(FillPolicy::Nan).normalize(&frame, None);
        assert_eq!(out.missing.len(), 6);
        assert_eq!(out.moments.left.knee_flexion.len(), 150);
        assert!(out.moments.left.knee_flexion.iter().all(|m| m.is_nan()));

        let zero = normalizer(FillPolicy::Zero).normalize(&frame, None);
        assert!(zero.moments.right.hip_flexion.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_named_signals() {
        let frame = PhaseFrame::new(0.1, 1.3).unwrap();
        let out = normalizer(FillPolicy::Nan).normalize(&frame, Some(&table()));
        let names: Vec<String> = out.named(Side::Right).into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"knee_flexion_moment_ipsi".to_string()));
        assert!(names.contains(&"ankle_dorsiflexion_moment_contra".to_string()));
    }
}
