// src/config/constants.rs
//! Pipeline-wide constants backing the configuration defaults

/// Phase grid constants
pub mod phase {
    /// Samples per normalized stride
    pub const NUM_POINTS: usize = 150;
    pub const START_PERCENT: f64 = 0.0;
    pub const END_PERCENT: f64 = 100.0;
    /// Tolerance for `phase_rate * stride_duration == 100`
    pub const RATE_TOLERANCE: f64 = 1e-6;
}

/// Stride acceptance constants
pub mod stride {
    pub const MIN_GAIT_PERCENT_SAMPLES: usize = 10;
    pub const MIN_PEAK_GAIT_PERCENT: f64 = 50.0;
    pub const MIN_SIGNAL_SAMPLES: usize = 10;
    pub const DEFAULT_SPEED_TOLERANCE_M_S: f64 = 0.05;
}

/// Marker-based heel-strike fallback constants
pub mod events {
    pub const DEFAULT_HEEL_LANDMARK: &str = "Heel";
    /// Minimum downward heel speed during late swing (mm/s)
    pub const SWING_VELOCITY_THRESHOLD_MM_S: f64 = 100.0;
    /// Maximum heel height above its trial minimum at contact (mm)
    pub const STANCE_HEIGHT_THRESHOLD_MM: f64 = 30.0;
    /// Events closer than this are merged
    pub const MIN_EVENT_INTERVAL_S: f64 = 0.5;
    /// Samples inspected before a crossing for the swing check
    pub const SWING_LOOKBACK_S: f64 = 0.15;
}

/// Physical constants
pub mod physics {
    pub const GRAVITY_M_S2: f64 = 9.81;
    pub const MM_PER_M: f64 = 1000.0;
}

/// Force-plate assignment constants
pub mod force_plate {
    pub const CONTACT_THRESHOLD_N: f64 = 200.0;
    pub const CONTACT_DELAY_S: f64 = 0.2;
    pub const EARLY_WINDOW_PERCENT: (f64, f64) = (0.0, 60.0);
    pub const LATE_WINDOW_PERCENT: (f64, f64) = (40.0, 100.0);
    pub const TREADMILL_RIGHT_PLATE: &str = "Treadmill_R";
    pub const TREADMILL_LEFT_PLATE: &str = "Treadmill_L";
}

/// Ipsi/contra swap detection constants
pub mod swap {
    pub const EARLY_STANCE_PERCENT: (f64, f64) = (10.0, 40.0);
    pub const LATE_SWING_PERCENT: (f64, f64) = (70.0, 95.0);
    pub const MIN_LATE_SWING_BW: f64 = 0.3;
    pub const LATE_TO_EARLY_RATIO: f64 = 0.5;
}

/// Center-of-pressure constants
pub mod cop {
    pub const CONTACT_THRESHOLD_BW: f64 = 0.2;
    pub const DEFAULT_ANKLE_LANDMARK: &str = "Ankle";
}

/// Validator constants
pub mod validation {
    /// Allowed |fresh - stored| mean RMSE difference (Nm/kg)
    pub const DEFAULT_RMSE_TOLERANCE: f64 = 0.01;
}

/// Configuration file locations and environment overrides
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/gait-core/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/gait-core";
    pub const DEFAULT_CONFIG_FILE: &str = "gait-core.toml";
    pub const LOCAL_CONFIG_FILE: &str = "gait-core.local.toml";
    pub const ENV_PREFIX: &str = "GAIT_";
}
