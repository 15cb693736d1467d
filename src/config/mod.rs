// src/config/mod.rs
//! Pipeline configuration management
//!
//! The converter variants that grew around this algorithm (speed tolerance,
//! force-plate heuristics, NaN-vs-zero fill) are consolidated into one
//! parameterized [`PipelineConfig`]. Every field has a default backed by
//! [`constants`], so an empty TOML file yields the canonical pipeline.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};

use crate::trial::Axis;
use crate::utils::validation::{validate_range, validate_window};

/// Complete pipeline configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub events: EventConfig,
    #[serde(default)]
    pub resampling: ResamplingConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub force_plate: ForcePlateConfig,
    #[serde(default)]
    pub cop: CopConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// How a trial is split into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Contiguous runs of non-idle activity labels
    LabelBased,
    /// One segment spanning the whole trial
    WholeTrial,
}

/// Fill value for absent or unresolved signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    Nan,
    Zero,
}

impl FillPolicy {
    pub fn value(self) -> f64 {
        match self {
            FillPolicy::Nan => f64::NAN,
            FillPolicy::Zero => 0.0,
        }
    }
}

/// Stair/ramp force-plate assignment heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateAssignmentStrategy {
    /// Plate loaded above threshold 200 ms after ipsilateral heel strike
    #[serde(rename = "delay_200ms")]
    Delay200ms,
    /// Early (ipsi) and late (contra) windowed peak force
    #[serde(rename = "early_late_window")]
    EarlyLateWindow,
}

/// Time-to-phase resampling method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingMethod {
    /// Interpolate directly onto 150 target timestamps
    DirectTime,
    /// Stride-local time, then time to percent, then 150 points
    LegacyTwoStage,
}

/// Mapping of source axes onto anatomical directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisMap {
    #[serde(default = "defaults::vertical_axis")]
    pub vertical: Axis,
    #[serde(default = "defaults::anterior_axis")]
    pub anterior: Axis,
    #[serde(default = "defaults::lateral_axis")]
    pub lateral: Axis,
}

/// Segmentation and stride acceptance settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    #[serde(default = "defaults::segmentation_mode")]
    pub mode: SegmentationMode,

    #[serde(default = "defaults::min_gait_percent_samples")]
    pub min_gait_percent_samples: usize,

    #[serde(default = "defaults::min_peak_gait_percent")]
    pub min_peak_gait_percent: f64,

    #[serde(default = "defaults::min_signal_samples")]
    pub min_signal_samples: usize,

    /// Allowed deviation of mean belt speed from the nominal speed
    #[serde(default = "defaults::speed_tolerance")]
    pub speed_tolerance: f64,

    #[serde(default = "defaults::idle_labels")]
    pub idle_labels: Vec<String>,
}

/// Heel-strike detection settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EventConfig {
    /// Fall back to heel-marker velocity when a gait-cycle table is absent
    #[serde(default = "defaults::enabled")]
    pub marker_fallback: bool,

    #[serde(default = "defaults::heel_landmark")]
    pub heel_landmark: String,

    #[serde(default = "defaults::swing_velocity_threshold_mm_s")]
    pub swing_velocity_threshold_mm_s: f64,

    #[serde(default = "defaults::stance_height_threshold_mm")]
    pub stance_height_threshold_mm: f64,

    #[serde(default = "defaults::min_event_interval_s")]
    pub min_event_interval_s: f64,

    #[serde(default = "defaults::swing_lookback_s")]
    pub swing_lookback_s: f64,

    #[serde(default = "defaults::marker_axes")]
    pub marker_axes: AxisMap,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResamplingConfig {
    #[serde(default = "defaults::resampling_method")]
    pub method: ResamplingMethod,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SignalConfig {
    /// Fill for absent moment channels and unresolved GRF/COP
    #[serde(default = "defaults::missing_signal_fill")]
    pub missing_signal_fill: FillPolicy,
}

/// Force-plate assignment settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ForcePlateConfig {
    #[serde(default = "defaults::plate_assignment_strategy")]
    pub plate_assignment_strategy: PlateAssignmentStrategy,

    #[serde(default = "defaults::contact_threshold_n")]
    pub contact_threshold_n: f64,

    #[serde(default = "defaults::contact_delay_s")]
    pub contact_delay_s: f64,

    #[serde(default = "defaults::early_window_percent")]
    pub early_window_percent: (f64, f64),

    #[serde(default = "defaults::late_window_percent")]
    pub late_window_percent: (f64, f64),

    #[serde(default = "defaults::treadmill_right_plate")]
    pub treadmill_right_plate: String,

    #[serde(default = "defaults::treadmill_left_plate")]
    pub treadmill_left_plate: String,

    #[serde(default = "defaults::force_axes")]
    pub axes: AxisMap,

    #[serde(default)]
    pub swap: SwapConfig,
}

/// Post-assignment ipsi/contra swap check
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SwapConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::early_stance_percent")]
    pub early_stance_percent: (f64, f64),

    #[serde(default = "defaults::late_swing_percent")]
    pub late_swing_percent: (f64, f64),

    #[serde(default = "defaults::min_late_swing_bw")]
    pub min_late_swing_bw: f64,

    #[serde(default = "defaults::late_to_early_ratio")]
    pub late_to_early_ratio: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CopConfig {
    #[serde(default = "defaults::cop_contact_threshold_bw")]
    pub contact_threshold_bw: f64,

    #[serde(default = "defaults::ankle_landmark")]
    pub ankle_landmark: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CalibrationConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Also calibrate the contralateral side when its reference exists
    #[serde(default = "defaults::enabled")]
    pub calibrate_contra: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ValidationConfig {
    #[serde(default = "defaults::rmse_tolerance")]
    pub rmse_tolerance: f64,
}

/// Default value providers using constants
mod defaults {
    use super::*;
    use crate::config::constants::*;

    pub fn enabled() -> bool { true }

    pub fn segmentation_mode() -> SegmentationMode { SegmentationMode::LabelBased }
    pub fn min_gait_percent_samples() -> usize { stride::MIN_GAIT_PERCENT_SAMPLES }
    pub fn min_peak_gait_percent() -> f64 { stride::MIN_PEAK_GAIT_PERCENT }
    pub fn min_signal_samples() -> usize { stride::MIN_SIGNAL_SAMPLES }
    pub fn speed_tolerance() -> f64 { stride::DEFAULT_SPEED_TOLERANCE_M_S }
    pub fn idle_labels() -> Vec<String> { vec!["idle".to_string(), "stand".to_string()] }

    pub fn heel_landmark() -> String { events::DEFAULT_HEEL_LANDMARK.to_string() }
    pub fn swing_velocity_threshold_mm_s() -> f64 { events::SWING_VELOCITY_THRESHOLD_MM_S }
    pub fn stance_height_threshold_mm() -> f64 { events::STANCE_HEIGHT_THRESHOLD_MM }
    pub fn min_event_interval_s() -> f64 { events::MIN_EVENT_INTERVAL_S }
    pub fn swing_lookback_s() -> f64 { events::SWING_LOOKBACK_S }

    pub fn vertical_axis() -> Axis { Axis::Y }
    pub fn anterior_axis() -> Axis { Axis::Z }
    pub fn lateral_axis() -> Axis { Axis::X }
    pub fn marker_axes() -> AxisMap { AxisMap::default() }
    pub fn force_axes() -> AxisMap { AxisMap::default() }

    pub fn resampling_method() -> ResamplingMethod { ResamplingMethod::DirectTime }
    pub fn missing_signal_fill() -> FillPolicy { FillPolicy::Nan }

    pub fn plate_assignment_strategy() -> PlateAssignmentStrategy { PlateAssignmentStrategy::EarlyLateWindow }
    pub fn contact_threshold_n() -> f64 { force_plate::CONTACT_THRESHOLD_N }
    pub fn contact_delay_s() -> f64 { force_plate::CONTACT_DELAY_S }
    pub fn early_window_percent() -> (f64, f64) { force_plate::EARLY_WINDOW_PERCENT }
    pub fn late_window_percent() -> (f64, f64) { force_plate::LATE_WINDOW_PERCENT }
    pub fn treadmill_right_plate() -> String { force_plate::TREADMILL_RIGHT_PLATE.to_string() }
    pub fn treadmill_left_plate() -> String { force_plate::TREADMILL_LEFT_PLATE.to_string() }

    pub fn early_stance_percent() -> (f64, f64) { swap::EARLY_STANCE_PERCENT }
    pub fn late_swing_percent() -> (f64, f64) { swap::LATE_SWING_PERCENT }
    pub fn min_late_swing_bw() -> f64 { swap::MIN_LATE_SWING_BW }
    pub fn late_to_early_ratio() -> f64 { swap::LATE_TO_EARLY_RATIO }

    pub fn cop_contact_threshold_bw() -> f64 { cop::CONTACT_THRESHOLD_BW }
    pub fn ankle_landmark() -> String { cop::DEFAULT_ANKLE_LANDMARK.to_string() }

    pub fn rmse_tolerance() -> f64 { validation::DEFAULT_RMSE_TOLERANCE }
}

impl Default for AxisMap {
    fn default() -> Self {
        Self {
            vertical: defaults::vertical_axis(),
            anterior: defaults::anterior_axis(),
            lateral: defaults::lateral_axis(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            mode: defaults::segmentation_mode(),
            min_gait_percent_samples: defaults::min_gait_percent_samples(),
            min_peak_gait_percent: defaults::min_peak_gait_percent(),
            min_signal_samples: defaults::min_signal_samples(),
            speed_tolerance: defaults::speed_tolerance(),
            idle_labels: defaults::idle_labels(),
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            marker_fallback: defaults::enabled(),
            heel_landmark: defaults::heel_landmark(),
            swing_velocity_threshold_mm_s: defaults::swing_velocity_threshold_mm_s(),
            stance_height_threshold_mm: defaults::stance_height_threshold_mm(),
            min_event_interval_s: defaults::min_event_interval_s(),
            swing_lookback_s: defaults::swing_lookback_s(),
            marker_axes: defaults::marker_axes(),
        }
    }
}

impl Default for ResamplingConfig {
    fn default() -> Self {
        Self { method: defaults::resampling_method() }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self { missing_signal_fill: defaults::missing_signal_fill() }
    }
}

impl Default for ForcePlateConfig {
    fn default() -> Self {
        Self {
            plate_assignment_strategy: defaults::plate_assignment_strategy(),
            contact_threshold_n: defaults::contact_threshold_n(),
            contact_delay_s: defaults::contact_delay_s(),
            early_window_percent: defaults::early_window_percent(),
            late_window_percent: defaults::late_window_percent(),
            treadmill_right_plate: defaults::treadmill_right_plate(),
            treadmill_left_plate: defaults::treadmill_left_plate(),
            axes: defaults::force_axes(),
            swap: SwapConfig::default(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            early_stance_percent: defaults::early_stance_percent(),
            late_swing_percent: defaults::late_swing_percent(),
            min_late_swing_bw: defaults::min_late_swing_bw(),
            late_to_early_ratio: defaults::late_to_early_ratio(),
        }
    }
}

impl Default for CopConfig {
    fn default() -> Self {
        Self {
            contact_threshold_bw: defaults::cop_contact_threshold_bw(),
            ankle_landmark: defaults::ankle_landmark(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            calibrate_contra: defaults::enabled(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { rmse_tolerance: defaults::rmse_tolerance() }
    }
}

impl AxisMap {
    fn is_permutation(&self) -> bool {
        self.vertical != self.anterior && self.vertical != self.lateral && self.anterior != self.lateral
    }
}

/// Configuration utility functions
impl PipelineConfig {
    /// Validate configuration consistency, collecting every violation
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut check = |result: Result<(), crate::utils::validation::ValidationError>| {
            if let Err(e) = result {
                errors.push(e.to_string());
            }
        };

        let seg = &self.segmentation;
        check(validate_range(seg.min_gait_percent_samples, 2, 10_000, "segmentation.min_gait_percent_samples"));
        check(validate_range(seg.min_signal_samples, 2, 10_000, "segmentation.min_signal_samples"));
        check(validate_range(seg.min_peak_gait_percent, 0.0, 100.0, "segmentation.min_peak_gait_percent"));
        check(validate_range(seg.speed_tolerance, 0.0, 10.0, "segmentation.speed_tolerance"));

        let ev = &self.events;
        check(validate_range(ev.swing_velocity_threshold_mm_s, 0.0, 10_000.0, "events.swing_velocity_threshold_mm_s"));
        check(validate_range(ev.stance_height_threshold_mm, 0.0, 1_000.0, "events.stance_height_threshold_mm"));
        check(validate_range(ev.min_event_interval_s, 0.0, 10.0, "events.min_event_interval_s"));
        check(validate_range(ev.swing_lookback_s, 0.0, 2.0, "events.swing_lookback_s"));

        let fp = &self.force_plate;
        check(validate_range(fp.contact_threshold_n, 0.0, 10_000.0, "force_plate.contact_threshold_n"));
        check(validate_range(fp.contact_delay_s, 0.0, 2.0, "force_plate.contact_delay_s"));
        check(validate_window(fp.early_window_percent, "force_plate.early_window_percent"));
        check(validate_window(fp.late_window_percent, "force_plate.late_window_percent"));
        check(validate_window(fp.swap.early_stance_percent, "force_plate.swap.early_stance_percent"));
        check(validate_window(fp.swap.late_swing_percent, "force_plate.swap.late_swing_percent"));
        check(validate_range(fp.swap.min_late_swing_bw, 0.0, 10.0, "force_plate.swap.min_late_swing_bw"));
        check(validate_range(fp.swap.late_to_early_ratio, 0.0, 10.0, "force_plate.swap.late_to_early_ratio"));

        check(validate_range(self.cop.contact_threshold_bw, 0.0, 5.0, "cop.contact_threshold_bw"));
        check(validate_range(self.validation.rmse_tolerance, 0.0, 100.0, "validation.rmse_tolerance"));

        if !fp.axes.is_permutation() {
            errors.push("force_plate.axes must map three distinct axes".to_string());
        }
        if !ev.marker_axes.is_permutation() {
            errors.push("events.marker_axes must map three distinct axes".to_string());
        }
        if fp.treadmill_right_plate == fp.treadmill_left_plate {
            errors.push("Treadmill plates for the two sides must differ".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            segmentation_mode: self.segmentation.mode,
            resampling_method: self.resampling.method,
            missing_signal_fill: self.signals.missing_signal_fill,
            plate_assignment_strategy: self.force_plate.plate_assignment_strategy,
            speed_tolerance: self.segmentation.speed_tolerance,
            calibration_enabled: self.calibration.enabled,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub segmentation_mode: SegmentationMode,
    pub resampling_method: ResamplingMethod,
    pub missing_signal_fill: FillPolicy,
    pub plate_assignment_strategy: PlateAssignmentStrategy,
    pub speed_tolerance: f64,
    pub calibration_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = PipelineConfig::default();
        assert_eq!(config.force_plate.contact_threshold_n, force_plate::CONTACT_THRESHOLD_N);
        assert_eq!(config.signals.missing_signal_fill, FillPolicy::Nan);
        assert_eq!(config.resampling.method, ResamplingMethod::DirectTime);
        assert!(config.validate_consistency().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: PipelineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
[force_plate]
plate_assignment_strategy = "delay_200ms"

[signals]
missing_signal_fill = "zero"
"#,
        )
        .unwrap();
        assert_eq!(config.force_plate.plate_assignment_strategy, PlateAssignmentStrategy::Delay200ms);
        assert_eq!(config.force_plate.contact_threshold_n, 200.0);
        assert_eq!(config.signals.missing_signal_fill, FillPolicy::Zero);
        assert_eq!(config.segmentation.mode, SegmentationMode::LabelBased);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PipelineConfig::default();
        config.force_plate.early_window_percent = (60.0, 10.0);
        config.force_plate.axes.anterior = Axis::Y;

        let errors = config.validate_consistency().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_fill_policy_values() {
        assert!(FillPolicy::Nan.value().is_nan());
        assert_eq!(FillPolicy::Zero.value(), 0.0);
    }
}
