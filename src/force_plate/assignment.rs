// src/force_plate/assignment.rs
//! Mode-dependent assignment of force plates to the ipsi/contra legs

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, warn};

use super::PlateView;
use crate::config::{ForcePlateConfig, PlateAssignmentStrategy};
use crate::error::{GaitError, GaitErrorBuilder};
use crate::resampling::{PhaseFrame, PhaseResampler, SignalKind};
use crate::trial::naming::plate_ids;
use crate::trial::{ChannelTable, LocomotionMode, Role, Side};
use crate::utils::numeric::{interp, masked, nan_max, window_mask, Extrapolation};

/// Plate ids chosen for each role of one stride
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlateAssignment {
    pub ipsi: Option<String>,
    pub contra: Option<String>,
    /// GRF intentionally not assigned for this mode
    pub skipped: bool,
}

impl PlateAssignment {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Ipsi => self.ipsi.as_deref(),
            Role::Contra => self.contra.as_deref(),
        }
    }

    /// Exchange the ipsi and contra plates
    pub fn swapped(self) -> Self {
        Self {
            ipsi: self.contra,
            contra: self.ipsi,
            skipped: self.skipped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentOutcome {
    pub assignment: PlateAssignment,
    /// One `ForceAssignmentAmbiguous` per role left without a plate
    pub unresolved: Vec<GaitError>,
}

/// Peak vertical force of one plate in the early and late stride windows
#[derive(Debug, Clone)]
struct WindowPeaks {
    plate: String,
    early: Option<f64>,
    late: Option<f64>,
}

pub struct PlateAssigner<'a> {
    config: &'a ForcePlateConfig,
    resampler: PhaseResampler,
}

impl<'a> PlateAssigner<'a> {
    pub fn new(config: &'a ForcePlateConfig, resampler: PhaseResampler) -> Self {
        Self { config, resampler }
    }

    /// Assign plates for one stride of the `ipsi` leg
    pub fn assign(&self, mode: LocomotionMode, plates: &ChannelTable, frame: &PhaseFrame, ipsi: Side) -> AssignmentOutcome {
        let assignment = match mode {
            LocomotionMode::LevelGround => {
                debug!("level-ground trial, GRF assignment skipped");
                return AssignmentOutcome {
                    assignment: PlateAssignment {
                        skipped: true,
                        ..Default::default()
                    },
                    unresolved: Vec::new(),
                };
            }
            LocomotionMode::Treadmill => self.treadmill(plates, frame, ipsi),
            LocomotionMode::Ramp | LocomotionMode::Stair => match self.config.plate_assignment_strategy {
                PlateAssignmentStrategy::Delay200ms => self.delay_after_strike(plates, frame),
                PlateAssignmentStrategy::EarlyLateWindow => self.early_late_window(plates, frame),
            },
        };

        let unresolved = self.unresolved(mode, &assignment, frame);
        AssignmentOutcome { assignment, unresolved }
    }

    /// One `ForceAssignmentAmbiguous` per role of `assignment` without a plate
    ///
    /// Call again after the roles of an assignment have been exchanged.
    pub fn unresolved(&self, mode: LocomotionMode, assignment: &PlateAssignment, frame: &PhaseFrame) -> Vec<GaitError> {
        if assignment.skipped {
            return Vec::new();
        }
        Role::BOTH
            .iter()
            .filter(|role| assignment.get(**role).is_none())
            .map(|role| {
                warn!(role = %role, start = frame.start_time(), "no force plate resolved");
                GaitErrorBuilder::new("plate_assigner", "assign").force_ambiguous(
                    role.as_str(),
                    &format!("no plate above {} N for {} mode", self.config.contact_threshold_n, mode),
                )
            })
            .collect()
    }

    /// Dedicated belt plates per side
    ///
    /// A belt whose vertical force never reaches the contact threshold
    /// during the stride is left unassigned.
    fn treadmill(&self, plates: &ChannelTable, frame: &PhaseFrame, ipsi: Side) -> PlateAssignment {
        let belt = |side: Side| {
            let id = match side {
                Side::Right => &self.config.treadmill_right_plate,
                Side::Left => &self.config.treadmill_left_plate,
            };
            let force = PlateView::new(plates, id, self.config.axes)?.vertical_force()?;
            let peak = nan_max(&self.resampler.resample(frame, force, SignalKind::Force));
            match peak {
                Some(p) if p >= self.config.contact_threshold_n => Some(id.clone()),
                _ => {
                    debug!(plate = %id, peak = ?peak, "belt below contact threshold");
                    None
                }
            }
        };
        PlateAssignment {
            ipsi: belt(ipsi),
            contra: belt(ipsi.opposite()),
            skipped: false,
        }
    }

    /// Plate loaded above threshold a fixed delay after the ipsilateral strike
    ///
    /// Leaves the contralateral leg unresolved.
    fn delay_after_strike(&self, plates: &ChannelTable, frame: &PhaseFrame) -> PlateAssignment {
        let t = frame.start_time() + self.config.contact_delay_s;
        let ids = plate_ids(plates);
        let best = ids
            .iter()
            .filter_map(|id| {
                let force = PlateView::new(plates, id, self.config.axes)?.vertical_force()?;
                let value = interp(t, force.timestamps, force.values, Extrapolation::Nan);
                (value >= self.config.contact_threshold_n).then_some((id, value))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        debug!(plate = ?best.map(|b| b.0), time = t, "delay assignment");
        PlateAssignment {
            ipsi: best.map(|(id, _)| id.clone()),
            contra: None,
            skipped: false,
        }
    }

    /// Early-window peak picks ipsi, late-window peak picks contra
    fn early_late_window(&self, plates: &ChannelTable, frame: &PhaseFrame) -> PlateAssignment {
        let early_mask = window_mask(frame.phase(), self.config.early_window_percent);
        let late_mask = window_mask(frame.phase(), self.config.late_window_percent);
        let threshold = self.config.contact_threshold_n;
        let qualify = |peak: Option<f64>| peak.filter(|&p| p >= threshold);

        let peaks: Vec<WindowPeaks> = plate_ids(plates)
            .into_iter()
            .filter_map(|id| {
                let force = PlateView::new(plates, &id, self.config.axes)?.vertical_force()?;
                let resampled = self.resampler.resample(frame, force, SignalKind::Force);
                let early = qualify(nan_max(masked(&resampled, &early_mask)));
                let late = qualify(nan_max(masked(&resampled, &late_mask)));
                Some(WindowPeaks { plate: id, early, late })
            })
            .collect();

        let early = ranked(&peaks, |p| p.early);
        let late = ranked(&peaks, |p| p.late);

        let (ipsi, contra) = match (early.first().copied(), late.first().copied()) {
            (Some(e), Some(l)) if e.plate == l.plate => {
                let (early_peak, late_peak) = (e.early.unwrap_or(0.0), e.late.unwrap_or(0.0));
                debug!(plate = %e.plate, early_peak, late_peak, "plate wins both windows");
                if early_peak >= late_peak {
                    (Some(e), late.get(1).copied())
                } else {
                    (early.get(1).copied(), Some(l))
                }
            }
            (e, l) => (e, l),
        };

        PlateAssignment {
            ipsi: ipsi.map(|p| p.plate.clone()),
            contra: contra.map(|p| p.plate.clone()),
            skipped: false,
        }
    }
}

/// Plates with a qualifying peak, highest first; ties keep id order
fn ranked<'p>(peaks: &'p [WindowPeaks], key: impl Fn(&WindowPeaks) -> Option<f64>) -> Vec<&'p WindowPeaks> {
    let mut out: Vec<&WindowPeaks> = peaks.iter().filter(|p| key(*p).is_some()).collect();
    out.sort_by(|a, b| {
        key(*b)
            .unwrap_or(f64::NEG_INFINITY)
            .partial_cmp(&key(*a).unwrap_or(f64::NEG_INFINITY))
            .unwrap_or(Ordering::Equal)
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResamplingMethod;
    use crate::trial::naming::plate_force_column;
    use crate::trial::Axis;

    const DT: f64 = 0.01;

    /// Vertical force traces, one per plate, as functions of time
    fn plates(traces: &[(&str, &dyn Fn(f64) -> f64)]) -> ChannelTable {
        let header: Vec<f64> = (0..300).map(|i| i as f64 * DT).collect();
        let mut t = ChannelTable::new(header.clone()).unwrap();
        for (id, f) in traces {
            t.insert_column(&plate_force_column(id, Axis::Y), header.iter().map(|&x| f(x)).collect())
                .unwrap();
        }
        t
    }

    fn bump(start: f64, end: f64, peak: f64) -> impl Fn(f64) -> f64 {
        move |t| {
            if t >= start && t <= end {
                peak * (std::f64::consts::PI * (t - start) / (end - start)).sin()
            } else {
                0.0
            }
        }
    }

    fn assigner(config: &ForcePlateConfig) -> PlateAssigner<'_> {
        PlateAssigner::new(config, PhaseResampler::new(ResamplingMethod::DirectTime))
    }

    #[test]
    fn test_early_late_picks_distinct_plates() {
        let fp1 = bump(0.5, 1.1, 800.0);
        let fp2 = bump(1.0, 1.6, 750.0);
        let table = plates(&[("FP1", &fp1), ("FP2", &fp2)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::Stair, &table, &frame, Side::Right);
        assert_eq!(out.assignment.ipsi.as_deref(), Some("FP1"));
        assert_eq!(out.assignment.contra.as_deref(), Some("FP2"));
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn test_same_plate_collision_reassigns_loser() {
        // FP1 carries both feet; its early peak dominates
        let fp1 = |t: f64| bump(0.5, 1.1, 900.0)(t) + bump(1.0, 1.6, 600.0)(t);
        let fp2 = bump(1.0, 1.6, 400.0);
        let table = plates(&[("FP1", &fp1), ("FP2", &fp2)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::Ramp, &table, &frame, Side::Left);
        assert_eq!(out.assignment.ipsi.as_deref(), Some("FP1"));
        assert_eq!(out.assignment.contra.as_deref(), Some("FP2"));
    }

    #[test]
    fn test_collision_without_runner_up_is_unresolved() {
        let fp1 = bump(0.5, 1.5, 900.0);
        let fp2 = bump(0.5, 1.5, 100.0);
        let table = plates(&[("FP1", &fp1), ("FP2", &fp2)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::Stair, &table, &frame, Side::Right);
        assert!(out.assignment.ipsi.is_some());
        assert!(out.assignment.contra.is_none());
        assert_eq!(out.unresolved.len(), 1);
    }

    #[test]
    fn test_below_threshold_is_unresolved() {
        let fp1 = bump(0.5, 1.1, 150.0);
        let table = plates(&[("FP1", &fp1)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::Stair, &table, &frame, Side::Right);
        assert_eq!(out.assignment, PlateAssignment::default());
        assert_eq!(out.unresolved.len(), 2);
        assert!(out.unresolved.iter().all(|e| matches!(e, GaitError::ForceAssignmentAmbiguous { .. })));
    }

    #[test]
    fn test_delay_strategy_leaves_contra_unresolved() {
        let fp1 = bump(0.4, 1.2, 700.0);
        let fp2 = bump(0.0, 0.6, 700.0);
        let table = plates(&[("FP1", &fp1), ("FP2", &fp2)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig {
            plate_assignment_strategy: PlateAssignmentStrategy::Delay200ms,
            ..Default::default()
        };
        let out = assigner(&config).assign(LocomotionMode::Stair, &table, &frame, Side::Right);
        assert_eq!(out.assignment.ipsi.as_deref(), Some("FP1"));
        assert!(out.assignment.contra.is_none());
    }

    #[test]
    fn test_treadmill_uses_belt_plates() {
        let belt = |_: f64| 600.0;
        let table = plates(&[("Treadmill_R", &belt), ("Treadmill_L", &belt)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::Treadmill, &table, &frame, Side::Left);
        assert_eq!(out.assignment.ipsi.as_deref(), Some("Treadmill_L"));
        assert_eq!(out.assignment.contra.as_deref(), Some("Treadmill_R"));
    }

    #[test]
    fn test_unloaded_belt_is_unresolved() {
        let loaded = bump(0.5, 1.1, 700.0);
        let light = bump(1.0, 1.6, 150.0);
        let table = plates(&[("Treadmill_R", &loaded), ("Treadmill_L", &light)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::Treadmill, &table, &frame, Side::Right);
        assert_eq!(out.assignment.ipsi.as_deref(), Some("Treadmill_R"));
        assert!(out.assignment.contra.is_none());
        assert_eq!(out.unresolved.len(), 1);
        assert!(matches!(&out.unresolved[0], GaitError::ForceAssignmentAmbiguous { role, .. } if role == "contra"));
    }

    #[test]
    fn test_unresolved_follows_exchanged_roles() {
        let loaded = bump(0.5, 1.1, 700.0);
        let table = plates(&[("Treadmill_R", &loaded)]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let a = assigner(&config);
        let out = a.assign(LocomotionMode::Treadmill, &table, &frame, Side::Right);
        let exchanged = out.assignment.swapped();
        let errors = a.unresolved(LocomotionMode::Treadmill, &exchanged, &frame);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], GaitError::ForceAssignmentAmbiguous { role, .. } if role == "ipsi"));
    }

    #[test]
    fn test_level_ground_is_skipped() {
        let table = plates(&[]);
        let frame = PhaseFrame::new(0.5, 1.5).unwrap();
        let config = ForcePlateConfig::default();
        let out = assigner(&config).assign(LocomotionMode::LevelGround, &table, &frame, Side::Right);
        assert!(out.assignment.skipped);
        assert!(out.unresolved.is_empty());
    }
}
