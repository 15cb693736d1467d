// src/simulation/config.rs
//! Synthetic trial configuration

use serde::{Deserialize, Serialize};

use crate::calibration::SignPair;
use crate::trial::{LocomotionMode, Side};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub subject: String,
    pub trial: String,
    pub mode: LocomotionMode,
    pub mass_kg: f64,
    pub sample_rate_hz: f64,
    pub stride_period_s: f64,
    /// Complete right-leg gait cycles
    pub strides: usize,
    /// Time before the first right heel strike
    pub lead_in_s: f64,
    pub speed_m_s: Option<f64>,
    pub incline_deg: Option<f64>,
    pub stair_height_mm: Option<f64>,
    pub gait_cycle_sides: Vec<Side>,
    pub markers: bool,
    pub kinetics: bool,
    pub inverse_dynamics: bool,
    pub conditions: bool,
    /// Sign flips the raw anterior COP and shear carry
    pub true_signs: SignPair,
    pub plate_config: PlateConfig,
    pub label: Option<String>,
    pub noise: NoiseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateConfig {
    /// Multiplies every plate force
    pub force_scale: f64,
    /// Overground plates the contacts rotate over
    pub plate_count: usize,
    /// Write each leg's loads on the other leg's treadmill belt
    pub swap_treadmill_belts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Peak uniform noise added to joint angles, degrees
    pub angle_amplitude_deg: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            subject: "SIM01".to_string(),
            trial: "treadmill_01".to_string(),
            mode: LocomotionMode::Treadmill,
            mass_kg: 70.0,
            sample_rate_hz: 200.0,
            stride_period_s: 1.2,
            strides: 5,
            lead_in_s: 0.3,
            speed_m_s: Some(1.2),
            incline_deg: None,
            stair_height_mm: None,
            gait_cycle_sides: vec![Side::Right, Side::Left],
            markers: true,
            kinetics: true,
            inverse_dynamics: true,
            conditions: true,
            true_signs: SignPair::Unflipped,
            plate_config: PlateConfig::default(),
            label: None,
            noise: NoiseConfig::default(),
        }
    }
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            force_scale: 1.0,
            plate_count: 3,
            swap_treadmill_belts: false,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            angle_amplitude_deg: 0.0,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn treadmill(speed_m_s: f64) -> Self {
        Self {
            speed_m_s: Some(speed_m_s),
            ..Default::default()
        }
    }

    pub fn level_ground() -> Self {
        Self {
            trial: "levelground_01".to_string(),
            mode: LocomotionMode::LevelGround,
            speed_m_s: None,
            conditions: false,
            ..Default::default()
        }
    }

    pub fn stair(height_mm: f64) -> Self {
        Self {
            trial: "stair_01".to_string(),
            mode: LocomotionMode::Stair,
            speed_m_s: None,
            stair_height_mm: Some(height_mm),
            conditions: false,
            label: Some("stairascent".to_string()),
            ..Default::default()
        }
    }

    pub fn ramp(incline_deg: f64) -> Self {
        Self {
            trial: "ramp_01".to_string(),
            mode: LocomotionMode::Ramp,
            speed_m_s: None,
            incline_deg: Some(incline_deg),
            conditions: false,
            label: Some(if incline_deg >= 0.0 { "rampascent" } else { "rampdescent" }.to_string()),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: &str, trial: &str) -> Self {
        self.subject = subject.to_string();
        self.trial = trial.to_string();
        self
    }

    pub fn with_true_signs(mut self, pair: SignPair) -> Self {
        self.true_signs = pair;
        self
    }

    /// Samples per gait cycle
    pub fn period_samples(&self) -> usize {
        (self.stride_period_s * self.sample_rate_hz).round() as usize
    }
}
