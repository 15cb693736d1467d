//! Gait-Core: stride extraction and phase-normalized canonicalization of
//! motion-capture gait trials
//!
//! Raw trials (kinematics, kinetics, gait-cycle percent, force plates, markers)
//! are split into strides at heel strikes and every stride is resampled onto a
//! fixed 150-point phase grid. The library provides:
//!
//! - Heel-strike detection from gait-cycle tables or heel-marker velocity
//! - Stride segmentation with ipsilateral leg selection and quality gates
//! - Kinematic chain and kinetic normalization on the phase grid
//! - Force-plate assignment, swap correction and ankle-frame COP
//! - Exhaustive COP/shear sign calibration against an inverse-dynamics reference
//! - Parallel batch conversion and a fresh-versus-stored validator
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gait_core::config::PipelineConfig;
//! use gait_core::pipeline::BatchConverter;
//! use gait_core::simulation::{SimulationConfig, TrialGenerator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let trial = TrialGenerator::new(SimulationConfig::treadmill(1.2)).generate()?;
//!
//!     let output = BatchConverter::new(PipelineConfig::default()).convert(&[trial]);
//!     for record in &output.records {
//!         println!("{} step {} rate {:.2} %/s", record.task_id(), record.step_label(), record.phase_rate());
//!     }
//!     for failure in &output.failures {
//!         println!("{:?}: {}", failure.disposition, failure.message);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod calibration;
pub mod config;
pub mod error;
pub mod events;
pub mod force_plate;
pub mod kinematics;
pub mod kinetics;
pub mod pipeline;
pub mod resampling;
pub mod segmentation;
pub mod simulation;
pub mod trial;
pub mod utils;
pub mod validation;

// Re-export commonly used types for convenience
pub use calibration::{SignCalibration, SignPair};
pub use config::{ConfigLoader, PipelineConfig};
pub use error::{Disposition, GaitError, GaitResult};
pub use pipeline::{BatchConverter, BatchOutput, CanonicalStrideRecord, StrideConverter, UnitFailure};
pub use trial::{ChannelTable, LocomotionMode, RawTrial, Role, Side, TableKind, TrialInfo};
pub use validation::{Comparator, ComparisonQuery, RecordValidator, ValidationReport, Validator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Stride extraction and phase-normalized canonicalization of gait trials".to_string(),
        features: vec![
            "Heel-strike detection with marker fallback".to_string(),
            "150-point phase normalization".to_string(),
            "Force-plate assignment and COP canonicalization".to_string(),
            "Sign calibration against inverse dynamics".to_string(),
            "Parallel batch conversion".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
