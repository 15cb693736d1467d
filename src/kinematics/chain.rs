// src/kinematics/chain.rs
//! Segment angles derived from joint angles
//!
//! ```text
//! pelvis = pelvis_tilt
//! trunk  = pelvis + lumbar_extension   (pelvis when lumbar is absent)
//! thigh  = pelvis + hip_flexion
//! shank  = thigh  - knee_angle         (= thigh + knee_flexion)
//! foot   = shank  + ankle_angle
//! ```
//!
//! `knee_flexion` is the negated source `knee_angle`. The chain is generic over
//! sample count so the same formulas serve phase-rate and source-rate data.

use ndarray::Array1;

use crate::trial::{Role, Side, SideMap};

/// Source joint angles of one leg
#[derive(Debug, Clone, PartialEq)]
pub struct JointAngles {
    pub hip_flexion: Array1<f64>,
    /// Raw source convention, flexion positive
    pub knee_angle: Array1<f64>,
    pub ankle_angle: Array1<f64>,
}

/// Inputs of the chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainInputs {
    pub pelvis_tilt: Array1<f64>,
    pub lumbar_extension: Option<Array1<f64>>,
    pub legs: SideMap<JointAngles>,
}

impl ChainInputs {
    /// Apply `f` to every input signal
    pub fn map(&self, mut f: impl FnMut(&Array1<f64>) -> Array1<f64>) -> ChainInputs {
        let mut leg = |j: &JointAngles| JointAngles {
            hip_flexion: f(&j.hip_flexion),
            knee_angle: f(&j.knee_angle),
            ankle_angle: f(&j.ankle_angle),
        };
        let legs = SideMap::new(leg(&self.legs.right), leg(&self.legs.left));
        ChainInputs {
            pelvis_tilt: f(&self.pelvis_tilt),
            lumbar_extension: self.lumbar_extension.as_ref().map(&mut f),
            legs,
        }
    }
}

/// Canonical angles of one leg
#[derive(Debug, Clone, PartialEq)]
pub struct LegAngles {
    pub hip_flexion: Array1<f64>,
    pub knee_flexion: Array1<f64>,
    pub ankle_dorsiflexion: Array1<f64>,
    pub thigh: Array1<f64>,
    pub shank: Array1<f64>,
    pub foot: Array1<f64>,
}

impl LegAngles {
    fn map(&self, f: &mut impl FnMut(&Array1<f64>) -> Array1<f64>) -> LegAngles {
        LegAngles {
            hip_flexion: f(&self.hip_flexion),
            knee_flexion: f(&self.knee_flexion),
            ankle_dorsiflexion: f(&self.ankle_dorsiflexion),
            thigh: f(&self.thigh),
            shank: f(&self.shank),
            foot: f(&self.foot),
        }
    }

    fn entries(&self) -> [(&'static str, &Array1<f64>); 6] {
        [
            ("hip_flexion", &self.hip_flexion),
            ("knee_flexion", &self.knee_flexion),
            ("ankle_dorsiflexion", &self.ankle_dorsiflexion),
            ("thigh", &self.thigh),
            ("shank", &self.shank),
            ("foot", &self.foot),
        ]
    }
}

/// Full set of canonical angles
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicChain {
    pub pelvis: Array1<f64>,
    pub trunk: Array1<f64>,
    pub legs: SideMap<LegAngles>,
}

impl KinematicChain {
    pub fn compute(inputs: &ChainInputs) -> Self {
        let pelvis = inputs.pelvis_tilt.clone();
        let trunk = match &inputs.lumbar_extension {
            Some(lumbar) => &pelvis + lumbar,
            None => pelvis.clone(),
        };
        let legs = SideMap::from_fn(|side| {
            let joints = inputs.legs.get(side);
            let knee_flexion = -&joints.knee_angle;
            let thigh = &pelvis + &joints.hip_flexion;
            let shank = &thigh + &knee_flexion;
            let foot = &shank + &joints.ankle_angle;
            LegAngles {
                hip_flexion: joints.hip_flexion.clone(),
                knee_flexion,
                ankle_dorsiflexion: joints.ankle_angle.clone(),
                thigh,
                shank,
                foot,
            }
        });

        Self { pelvis, trunk, legs }
    }

    /// Apply `f` to every output signal
    pub fn map(&self, mut f: impl FnMut(&Array1<f64>) -> Array1<f64>) -> KinematicChain {
        KinematicChain {
            pelvis: f(&self.pelvis),
            trunk: f(&self.trunk),
            legs: SideMap::new(self.legs.right.map(&mut f), self.legs.left.map(&mut f)),
        }
    }

    /// Output signals named `<signal>_<kind>[_<role>]`
    ///
    /// `kind` is `angle` or `velocity`; pelvis and trunk carry no role.
    pub fn named(&self, ipsi: Side, kind: &str) -> Vec<(String, Array1<f64>)> {
        let mut out = vec![
            (format!("pelvis_{}", kind), self.pelvis.clone()),
            (format!("trunk_{}", kind), self.trunk.clone()),
        ];
        for role in Role::BOTH {
            for (name, signal) in self.legs.get(role.side(ipsi)).entries() {
                out.push((format!("{}_{}_{}", name, kind, role), signal.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(v: &[f64]) -> Array1<f64> {
        Array1::from(v.to_vec())
    }

    fn inputs() -> ChainInputs {
        ChainInputs {
            pelvis_tilt: arr(&[5.0, 6.0]),
            lumbar_extension: Some(arr(&[-2.0, -1.0])),
            legs: SideMap::new(
                JointAngles {
                    hip_flexion: arr(&[20.0, 30.0]),
                    knee_angle: arr(&[10.0, 60.0]),
                    ankle_angle: arr(&[3.0, -4.0]),
                },
                JointAngles {
                    hip_flexion: arr(&[-10.0, 0.0]),
                    knee_angle: arr(&[5.0, 5.0]),
                    ankle_angle: arr(&[0.0, 1.0]),
                },
            ),
        }
    }

    #[test]
    fn test_segment_identities() {
        let chain = KinematicChain::compute(&inputs());
        let right = &chain.legs.right;
        assert_eq!(chain.trunk, arr(&[3.0, 5.0]));
        assert_eq!(right.thigh, arr(&[25.0, 36.0]));
        assert_eq!(right.knee_flexion, arr(&[-10.0, -60.0]));
        assert_eq!(right.shank, arr(&[15.0, -24.0]));
        assert_eq!(right.foot, arr(&[18.0, -28.0]));
    }

    #[test]
    fn test_missing_lumbar_trunk_is_pelvis() {
        let mut i = inputs();
        i.lumbar_extension = None;
        let chain = KinematicChain::compute(&i);
        assert_eq!(chain.trunk, chain.pelvis);
    }

    #[test]
    fn test_named_signals_follow_roles() {
        let chain = KinematicChain::compute(&inputs());
        let named = chain.named(Side::Left, "angle");
        assert_eq!(named.len(), 14);
        let thigh_ipsi = named.iter().find(|(n, _)| n == "thigh_angle_ipsi").unwrap();
        assert_eq!(thigh_ipsi.1, chain.legs.left.thigh);
        assert!(named.iter().any(|(n, _)| n == "knee_flexion_angle_contra"));
    }
}
