// src/pipeline/mod.rs
//! Stride conversion pipeline
//!
//! ```text
//! events -> segmentation -> resampling -> { kinematics, kinetics, plates -> GRF/COP }
//!        -> sign calibration -> CanonicalStrideRecord
//! ```

pub mod batch;
pub mod converter;
pub mod record;

pub use batch::{assign_steps, BatchConverter, BatchOutput, BatchSummary, UnitFailure};
pub use converter::{PreparedTrial, SegmentOutput, StrideConverter};
pub use record::{CanonicalStrideRecord, PhaseRow};
