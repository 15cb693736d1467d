// src/simulation/trial_generator.rs
//! Synthetic motion-capture trials with known ground truth
//!
//! Right heel strikes fall exactly on samples, `lead_in_s` after the trial
//! starts, and repeat every `stride_period_s`; the left leg trails by half a
//! cycle. Raw plate channels carry the configured anterior COP and shear sign
//! flips, while the inverse-dynamics table holds the unflipped ankle moment.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::config::SimulationConfig;
use super::gait_model as model;
use crate::config::constants::force_plate::{TREADMILL_LEFT_PLATE, TREADMILL_RIGHT_PLATE};
use crate::config::constants::physics::{GRAVITY_M_S2, MM_PER_M};
use crate::error::GaitResult;
use crate::trial::naming::{
    joint_angle_column, joint_moment_column, marker_column, plate_cop_column, plate_force_column, Joint,
    HEEL_STRIKE_COLUMN, LUMBAR_EXTENSION, PELVIS_TILT, SPEED_COLUMN,
};
use crate::trial::{Axis, ChannelTable, LabelTrack, LocomotionMode, RawTrial, Side, SideMap, TableKind, TrialInfo};

/// Progression between consecutive contacts overground
const STEP_LENGTH_MM: f64 = 700.0;
const ANKLE_LATERAL_MM: f64 = 100.0;
/// Belt travel of the stance foot on a treadmill
const BELT_TRAVEL_MM: f64 = 600.0;
const HEEL_BEHIND_ANKLE_MM: f64 = 50.0;
const IDLE_LABEL: &str = "idle";

/// Where one leg is at one sample
#[derive(Debug, Clone, Copy)]
struct LegState {
    percent: f64,
    /// Contact number, counting right and left contacts alternately
    contact: i64,
}

/// One sample of a plate, lab frame
#[derive(Debug, Clone, Copy, Default)]
struct PlateSample {
    force: [f64; 3],
    cop: [f64; 3],
}

/// Six channels of one plate
#[derive(Debug, Clone)]
struct PlateColumns {
    id: String,
    force: [Vec<f64>; 3],
    cop: [Vec<f64>; 3],
}

impl PlateColumns {
    fn new(id: &str, n: usize) -> Self {
        Self {
            id: id.to_string(),
            force: [vec![0.0; n], vec![0.0; n], vec![0.0; n]],
            cop: [vec![0.0; n], vec![0.0; n], vec![0.0; n]],
        }
    }

    fn set(&mut self, i: usize, sample: PlateSample) {
        for axis in 0..3 {
            self.force[axis][i] = sample.force[axis];
            self.cop[axis][i] = sample.cop[axis];
        }
    }

    fn write_into(self, table: &mut ChannelTable) -> GaitResult<()> {
        for (axis, (force, cop)) in [Axis::X, Axis::Y, Axis::Z].into_iter().zip(self.force.into_iter().zip(self.cop)) {
            table.insert_column(&plate_force_column(&self.id, axis), force)?;
            table.insert_column(&plate_cop_column(&self.id, axis), cop)?;
        }
        Ok(())
    }
}

pub struct TrialGenerator {
    config: SimulationConfig,
    rng: StdRng,
}

impl TrialGenerator {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.noise.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn info(&self) -> TrialInfo {
        TrialInfo {
            subject: self.config.subject.clone(),
            trial: self.config.trial.clone(),
            mode: self.config.mode,
            mass_kg: self.config.mass_kg,
            speed_m_s: self.config.speed_m_s,
            incline_deg: self.config.incline_deg,
            stair_height_mm: self.config.stair_height_mm,
        }
    }

    fn first_strike_index(&self) -> usize {
        (self.config.lead_in_s * self.config.sample_rate_hz).round() as usize
    }

    fn sample_count(&self) -> usize {
        let period = self.config.period_samples();
        self.first_strike_index() + self.config.strides * period + period / 4 + 1
    }

    fn offset(&self, side: Side) -> usize {
        match side {
            Side::Right => self.first_strike_index(),
            Side::Left => self.first_strike_index() + self.config.period_samples() / 2,
        }
    }

    pub fn header(&self) -> Vec<f64> {
        (0..self.sample_count())
            .map(|i| i as f64 / self.config.sample_rate_hz)
            .collect()
    }

    /// Heel-strike sample indices of `side`
    ///
    /// The first sample of a trial is never a heel strike.
    pub fn strike_indices(&self, side: Side) -> Vec<usize> {
        let period = self.config.period_samples().max(1);
        let n = self.sample_count();
        (self.offset(side) % period..n)
            .step_by(period)
            .filter(|&i| i > 0)
            .collect()
    }

    pub fn strike_times(&self, side: Side) -> Vec<f64> {
        self.strike_indices(side)
            .into_iter()
            .map(|i| i as f64 / self.config.sample_rate_hz)
            .collect()
    }

    fn leg_state(&self, side: Side, i: usize) -> LegState {
        let period = self.config.period_samples().max(1) as i64;
        let k = i as i64 - self.offset(side) as i64;
        let cycle = k.div_euclid(period);
        LegState {
            percent: k.rem_euclid(period) as f64 / period as f64 * 100.0,
            contact: 2 * cycle + i64::from(side == Side::Left),
        }
    }

    /// Walking-surface height under contact `c`
    fn surface_mm(&self, contact: i64) -> f64 {
        let rise = match self.config.mode {
            LocomotionMode::Stair => {
                let height = self.config.stair_height_mm.unwrap_or(0.0);
                let descending = self.config.label.as_deref().is_some_and(|l| l.contains("descent"));
                if descending { -height } else { height }
            }
            LocomotionMode::Ramp => STEP_LENGTH_MM * self.config.incline_deg.unwrap_or(0.0).to_radians().tan(),
            LocomotionMode::Treadmill | LocomotionMode::LevelGround => 0.0,
        };
        rise * contact as f64
    }

    /// Surface height below the foot, moving to the next contact during swing
    fn surface_under(&self, state: LegState) -> f64 {
        let here = self.surface_mm(state.contact);
        let next = self.surface_mm(state.contact + 2);
        here + (next - here) * model::swing_fraction(state.percent)
    }

    /// Ankle marker position `[x, y, z]` in mm
    fn ankle_position(&self, side: Side, state: LegState) -> [f64; 3] {
        let p = state.percent;
        let lateral = match side {
            Side::Right => ANKLE_LATERAL_MM,
            Side::Left => -ANKLE_LATERAL_MM,
        };
        let vertical = self.surface_under(state) + model::ankle_height_mm(p);
        let anterior = if self.config.mode == LocomotionMode::Treadmill {
            if model::in_stance(p) {
                BELT_TRAVEL_MM / 2.0 - BELT_TRAVEL_MM * p / model::STANCE_PERCENT
            } else {
                -BELT_TRAVEL_MM / 2.0 + BELT_TRAVEL_MM * model::swing_fraction(p)
            }
        } else {
            STEP_LENGTH_MM * (state.contact as f64 + 2.0 * model::swing_fraction(p))
        };
        [lateral, vertical, anterior]
    }

    fn heel_position(&self, side: Side, state: LegState) -> [f64; 3] {
        let [x, _, z] = self.ankle_position(side, state);
        [x, self.surface_under(state) + model::heel_height_mm(state.percent), z - HEEL_BEHIND_ANKLE_MM]
    }

    /// Raw plate output under a leg, zero outside stance
    fn plate_sample(&self, side: Side, state: LegState) -> PlateSample {
        let p = state.percent;
        if !model::in_stance(p) {
            return PlateSample::default();
        }
        let body_weight = self.config.mass_kg * GRAVITY_M_S2 * self.config.plate_config.force_scale;
        let signs = self.config.true_signs;
        let [ankle_x, _, ankle_z] = self.ankle_position(side, state);
        PlateSample {
            force: [
                model::lateral_force_bw(p) * body_weight,
                model::vertical_force_bw(p) * body_weight,
                signs.sign_g() * model::anterior_force_bw(p) * body_weight,
            ],
            cop: [
                ankle_x,
                self.surface_mm(state.contact),
                ankle_z + signs.sign_a() * model::cop_anterior_m(p) * MM_PER_M,
            ],
        }
    }

    fn noise(&mut self) -> f64 {
        let amplitude = self.config.noise.angle_amplitude_deg;
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }

    /// Build the trial
    pub fn generate(&mut self) -> GaitResult<RawTrial> {
        let header = self.header();
        let n = header.len();
        let states: SideMap<Vec<LegState>> = SideMap::from_fn(|side| (0..n).map(|i| self.leg_state(side, i)).collect());
        let percent = |side: Side| -> Vec<f64> { states.get(side).iter().map(|s| s.percent).collect() };
        let mass = self.config.mass_kg;

        let mut trial = RawTrial::new(self.info());

        // kinematics
        let mut kinematics = ChannelTable::new(header.clone())?
            .with_column(PELVIS_TILT, percent(Side::Right).into_iter().map(model::pelvis_tilt_deg).collect())?
            .with_column(LUMBAR_EXTENSION, percent(Side::Right).into_iter().map(model::lumbar_extension_deg).collect())?;
        for side in Side::BOTH {
            for (joint, waveform) in [
                (Joint::Hip, model::hip_flexion_deg as fn(f64) -> f64),
                (Joint::Knee, model::knee_angle_deg),
                (Joint::Ankle, model::ankle_angle_deg),
            ] {
                let values = percent(side).into_iter().map(|p| waveform(p) + self.noise()).collect();
                kinematics.insert_column(&joint_angle_column(joint, side), values)?;
            }
        }
        trial.insert_table(TableKind::Kinematics, kinematics);

        for &side in &self.config.gait_cycle_sides {
            let table = ChannelTable::new(header.clone())?.with_column(HEEL_STRIKE_COLUMN, percent(side))?;
            trial.insert_table(TableKind::GaitCycle(side), table);
        }

        if self.config.kinetics {
            let mut kinetics = ChannelTable::new(header.clone())?;
            for side in Side::BOTH {
                for (joint, waveform) in [
                    (Joint::Hip, model::hip_moment as fn(f64) -> f64),
                    (Joint::Knee, model::knee_moment),
                    (Joint::Ankle, model::ankle_moment),
                ] {
                    let values = percent(side).into_iter().map(|p| waveform(p) * mass).collect();
                    kinetics.insert_column(&joint_moment_column(joint, side), values)?;
                }
            }
            trial.insert_table(TableKind::Kinetics, kinetics);
        }

        if self.config.inverse_dynamics {
            let mut reference = ChannelTable::new(header.clone())?;
            for side in Side::BOTH {
                let values = percent(side).into_iter().map(|p| model::ankle_moment(p) * mass).collect();
                reference.insert_column(&joint_moment_column(Joint::Ankle, side), values)?;
            }
            trial.insert_table(TableKind::InverseDynamics, reference);
        }

        if self.config.markers {
            let mut markers = ChannelTable::new(header.clone())?;
            for side in Side::BOTH {
                let ankle: Vec<[f64; 3]> = states.get(side).iter().map(|&s| self.ankle_position(side, s)).collect();
                let heel: Vec<[f64; 3]> = states.get(side).iter().map(|&s| self.heel_position(side, s)).collect();
                for (k, axis) in [Axis::X, Axis::Y, Axis::Z].into_iter().enumerate() {
                    markers.insert_column(&marker_column(side, "Ankle", axis), ankle.iter().map(|a| a[k]).collect())?;
                    markers.insert_column(&marker_column(side, "Heel", axis), heel.iter().map(|h| h[k]).collect())?;
                }
            }
            trial.insert_table(TableKind::Markers, markers);
        }

        if let Some(plates) = self.plate_table(&header, &states)? {
            trial.insert_table(TableKind::ForcePlates, plates);
        }

        if let (true, Some(speed)) = (self.config.conditions, self.config.speed_m_s) {
            let table = ChannelTable::new(header.clone())?.with_column(SPEED_COLUMN, vec![speed; n])?;
            trial.insert_table(TableKind::Conditions, table);
        }

        if let Some(label) = self.config.label.clone() {
            let strikes = self.strike_indices(Side::Right);
            let (first, last) = (strikes.first().copied().unwrap_or(0), strikes.last().copied().unwrap_or(0));
            let labels = (0..n)
                .map(|i| if (first..=last).contains(&i) { label.clone() } else { IDLE_LABEL.to_string() })
                .collect();
            trial.labels = Some(LabelTrack::new(header.clone(), labels)?);
        }

        debug!(
            trial = %trial.id(),
            samples = n,
            right_strikes = self.strike_indices(Side::Right).len(),
            left_strikes = self.strike_indices(Side::Left).len(),
            "synthetic trial generated"
        );
        Ok(trial)
    }

    fn plate_table(&self, header: &[f64], states: &SideMap<Vec<LegState>>) -> GaitResult<Option<ChannelTable>> {
        let n = header.len();
        let mut plates: Vec<PlateColumns> = match self.config.mode {
            LocomotionMode::LevelGround => return Ok(None),
            LocomotionMode::Treadmill => vec![
                PlateColumns::new(TREADMILL_RIGHT_PLATE, n),
                PlateColumns::new(TREADMILL_LEFT_PLATE, n),
            ],
            LocomotionMode::Stair | LocomotionMode::Ramp => (1..=self.config.plate_config.plate_count.max(1))
                .map(|k| PlateColumns::new(&format!("FP{}", k), n))
                .collect(),
        };

        let plate_count = plates.len() as i64;
        for side in Side::BOTH {
            for (i, &state) in states.get(side).iter().enumerate() {
                if !model::in_stance(state.percent) {
                    continue;
                }
                let plate = match self.config.mode {
                    LocomotionMode::Treadmill => {
                        let on_right_belt = (side == Side::Right) != self.config.plate_config.swap_treadmill_belts;
                        if on_right_belt { 0 } else { 1 }
                    }
                    _ => state.contact.rem_euclid(plate_count) as usize,
                };
                plates[plate].set(i, self.plate_sample(side, state));
            }
        }

        let mut table = ChannelTable::new(header.to_vec())?;
        for plate in plates {
            plate.write_into(&mut table)?;
        }
        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::SignPair;

    #[test]
    fn test_strikes_are_aligned_to_samples() {
        let generator = TrialGenerator::new(SimulationConfig::default());
        assert_eq!(generator.strike_indices(Side::Right), vec![60, 300, 540, 780, 1020, 1260]);
        assert_eq!(generator.strike_indices(Side::Left)[0], 180);
    }

    #[test]
    fn test_percent_is_zero_at_strikes() {
        let mut generator = TrialGenerator::new(SimulationConfig::default());
        let trial = generator.generate().unwrap();
        let percent = trial.table(TableKind::GaitCycle(Side::Right)).unwrap().column(HEEL_STRIKE_COLUMN).unwrap();
        for i in generator.strike_indices(Side::Right) {
            assert_eq!(percent[i], 0.0);
            assert!(percent[i - 1] > 99.0);
        }
    }

    #[test]
    fn test_treadmill_belts_carry_one_leg_each() {
        let mut generator = TrialGenerator::new(SimulationConfig::default());
        let trial = generator.generate().unwrap();
        let plates = trial.table(TableKind::ForcePlates).unwrap();
        let right = plates.column("Treadmill_R_vy").unwrap();
        let left = plates.column("Treadmill_L_vy").unwrap();
        // right mid-stance, left swing
        let i = 60 + 72;
        assert!(right[i] > 700.0);
        assert_eq!(left[i], 0.0);
    }

    #[test]
    fn test_raw_cop_carries_sign_flip() {
        let config = SimulationConfig::default().with_true_signs(SignPair::FlipCop);
        let mut generator = TrialGenerator::new(config);
        let trial = generator.generate().unwrap();
        let plates = trial.table(TableKind::ForcePlates).unwrap();
        let markers = trial.table(TableKind::Markers).unwrap();
        let i = 60 + 120;
        let cop = (plates.column("Treadmill_R_pz").unwrap()[i] - markers.column("R_Ankle_z").unwrap()[i]) / MM_PER_M;
        assert!((cop + model::cop_anterior_m(50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_overground_contacts_rotate_plates() {
        let mut generator = TrialGenerator::new(SimulationConfig::stair(150.0));
        let trial = generator.generate().unwrap();
        let plates = trial.table(TableKind::ForcePlates).unwrap();
        let loaded = |id: &str, i: usize| plates.column(&format!("{}_vy", id)).unwrap()[i] > 0.0;
        // right contact 0 on FP1, left contact 1 on FP2
        assert!(loaded("FP1", 60 + 72));
        assert!(loaded("FP2", 180 + 72));
        assert!(!loaded("FP3", 60 + 72));
    }

    #[test]
    fn test_label_track_brackets_strikes() {
        let mut generator = TrialGenerator::new(SimulationConfig::stair(150.0));
        let trial = generator.generate().unwrap();
        let runs = trial.labels.unwrap().runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].0, "stairascent");
        assert!((runs[1].1 - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_level_ground_has_no_plates() {
        let mut generator = TrialGenerator::new(SimulationConfig::level_ground());
        let trial = generator.generate().unwrap();
        assert!(!trial.has_table(TableKind::ForcePlates));
        assert!(trial.has_table(TableKind::Markers));
    }
}
