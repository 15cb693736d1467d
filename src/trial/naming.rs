// src/trial/naming.rs
//! Source channel naming conventions
//!
//! Force plates: `<PlateId>_{vx,vy,vz,px,py,pz}`. Markers:
//! `<Side>_<Landmark>_{x,y,z}`. Joint channels follow the OpenSim coordinate
//! names with `_r`/`_l` suffixes; moments append `_moment`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ChannelTable, Side};

pub const PELVIS_TILT: &str = "pelvis_tilt";
pub const LUMBAR_EXTENSION: &str = "lumbar_extension";
pub const HEEL_STRIKE_COLUMN: &str = "HeelStrike";
pub const SPEED_COLUMN: &str = "Speed";

/// Lower-limb joint coordinates present per side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Hip,
    Knee,
    Ankle,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::Hip, Joint::Knee, Joint::Ankle];

    /// Coordinate name in the source tables (without side suffix)
    pub fn source_coordinate(self) -> &'static str {
        match self {
            Joint::Hip => "hip_flexion",
            Joint::Knee => "knee_angle",
            Joint::Ankle => "ankle_angle",
        }
    }

    /// Canonical output name of the joint's sagittal coordinate
    pub fn canonical_name(self) -> &'static str {
        match self {
            Joint::Hip => "hip_flexion",
            Joint::Knee => "knee_flexion",
            Joint::Ankle => "ankle_dorsiflexion",
        }
    }
}

/// Cartesian component suffix of a plate or marker channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn suffix(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// `hip_flexion_r`
pub fn joint_angle_column(joint: Joint, side: Side) -> String {
    format!("{}_{}", joint.source_coordinate(), side.suffix())
}

/// `knee_angle_l_moment`
pub fn joint_moment_column(joint: Joint, side: Side) -> String {
    format!("{}_{}_moment", joint.source_coordinate(), side.suffix())
}

/// `FP3_vy`
pub fn plate_force_column(plate: &str, axis: Axis) -> String {
    format!("{}_v{}", plate, axis.suffix())
}

/// `FP3_pz`
pub fn plate_cop_column(plate: &str, axis: Axis) -> String {
    format!("{}_p{}", plate, axis.suffix())
}

/// `R_Ankle_y`
pub fn marker_column(side: Side, landmark: &str, axis: Axis) -> String {
    format!("{}_{}_{}", side.marker_prefix(), landmark, axis.suffix())
}

/// Plate ids found in a force-plate table, sorted
pub fn plate_ids(table: &ChannelTable) -> Vec<String> {
    let mut ids = BTreeSet::new();
    for name in table.column_names() {
        for suffix in ["_vx", "_vy", "_vz"] {
            if let Some(id) = name.strip_suffix(suffix) {
                ids.insert(id.to_string());
            }
        }
    }
    ids.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(joint_angle_column(Joint::Knee, Side::Right), "knee_angle_r");
        assert_eq!(joint_moment_column(Joint::Ankle, Side::Left), "ankle_angle_l_moment");
        assert_eq!(plate_force_column("FP1", Axis::Y), "FP1_vy");
        assert_eq!(plate_cop_column("Treadmill_R", Axis::Z), "Treadmill_R_pz");
        assert_eq!(marker_column(Side::Left, "Ankle", Axis::X), "L_Ankle_x");
    }

    #[test]
    fn test_plate_discovery() {
        let n = 3;
        let table = ChannelTable::new(vec![0.0, 0.1, 0.2])
            .unwrap()
            .with_column("FP2_vy", vec![0.0; n])
            .unwrap()
            .with_column("FP2_py", vec![0.0; n])
            .unwrap()
            .with_column("FP1_vx", vec![0.0; n])
            .unwrap()
            .with_column("FP1_vy", vec![0.0; n])
            .unwrap();
        assert_eq!(plate_ids(&table), vec!["FP1".to_string(), "FP2".to_string()]);
    }
}
