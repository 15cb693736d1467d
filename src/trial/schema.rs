// src/trial/schema.rs
//! Per-mode table schema
//!
//! Channels are accessed by name, but which tables must exist is fixed per
//! locomotion mode and checked once before any processing.

use super::{LocomotionMode, RawTrial, Side, TableKind};
use crate::error::{GaitErrorBuilder, GaitResult};

/// Tables a trial must and may provide for its mode
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSchema {
    pub mode: LocomotionMode,
    pub mandatory: Vec<TableKind>,
    pub optional: Vec<TableKind>,
}

impl TrialSchema {
    pub fn for_mode(mode: LocomotionMode) -> Self {
        let mut mandatory = vec![TableKind::Kinematics];
        let mut optional = vec![
            TableKind::Kinetics,
            TableKind::GaitCycle(Side::Right),
            TableKind::GaitCycle(Side::Left),
            TableKind::Markers,
            TableKind::InverseDynamics,
        ];

        match mode {
            // Level overground GRF is skipped, so plates are not required
            LocomotionMode::LevelGround => optional.push(TableKind::ForcePlates),
            LocomotionMode::Treadmill => {
                mandatory.push(TableKind::ForcePlates);
                optional.push(TableKind::Conditions);
            }
            LocomotionMode::Ramp | LocomotionMode::Stair => mandatory.push(TableKind::ForcePlates),
        }

        Self {
            mode,
            mandatory,
            optional,
        }
    }

    /// Check that every mandatory table is present and that events can be found
    ///
    /// Heel strikes come from at least one gait-cycle table or, failing that,
    /// from the marker table.
    pub fn check(&self, trial: &RawTrial) -> GaitResult<()> {
        for kind in &self.mandatory {
            if !trial.has_table(*kind) {
                return Err(GaitErrorBuilder::new("schema", "check").missing_table(*kind, &trial.id()));
            }
        }

        let has_events = Side::BOTH
            .iter()
            .any(|s| trial.has_table(TableKind::GaitCycle(*s)))
            || trial.has_table(TableKind::Markers);
        if !has_events {
            return Err(GaitErrorBuilder::new("schema", "check")
                .missing_table(TableKind::GaitCycle(Side::Right), &trial.id()));
        }

        if !(trial.info.mass_kg.is_finite() && trial.info.mass_kg > 0.0) {
            return Err(GaitErrorBuilder::new("schema", "check").invalid_data_with(
                "subject mass",
                "mass must be a positive number of kilograms",
                "> 0".to_string(),
                trial.info.mass_kg.to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Disposition, GaitError};
    use crate::trial::{ChannelTable, TrialInfo};

    fn info(mode: LocomotionMode) -> TrialInfo {
        TrialInfo {
            subject: "AB01".into(),
            trial: "stair_1".into(),
            mode,
            mass_kg: 70.0,
            speed_m_s: None,
            incline_deg: None,
            stair_height_mm: Some(152.0),
        }
    }

    fn table() -> ChannelTable {
        ChannelTable::new(vec![0.0, 0.1]).unwrap()
    }

    #[test]
    fn test_stair_requires_force_plates() {
        let trial = RawTrial::new(info(LocomotionMode::Stair))
            .with_table(TableKind::Kinematics, table())
            .with_table(TableKind::GaitCycle(Side::Right), table());
        let err = TrialSchema::for_mode(LocomotionMode::Stair).check(&trial).unwrap_err();
        assert!(matches!(err, GaitError::MissingMandatoryTable { table: TableKind::ForcePlates, .. }));
        assert_eq!(err.disposition(), Disposition::AbortTrial);
    }

    #[test]
    fn test_level_ground_accepts_marker_events_without_plates() {
        let trial = RawTrial::new(info(LocomotionMode::LevelGround))
            .with_table(TableKind::Kinematics, table())
            .with_table(TableKind::Markers, table());
        assert!(TrialSchema::for_mode(LocomotionMode::LevelGround).check(&trial).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let mut i = info(LocomotionMode::LevelGround);
        i.mass_kg = 0.0;
        let trial = RawTrial::new(i)
            .with_table(TableKind::Kinematics, table())
            .with_table(TableKind::GaitCycle(Side::Left), table());
        assert!(TrialSchema::for_mode(LocomotionMode::LevelGround).check(&trial).is_err());
    }
}
