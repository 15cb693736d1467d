// src/utils/mod.rs
//! Common utilities shared across the pipeline
//!
//! - Numeric helpers (interpolation, gradients, NaN-aware reductions)
//! - Validation helpers for configuration parameters

pub mod numeric;
pub mod validation;

pub use numeric::{
    gradient,
    interp,
    interp_many,
    linspace,
    nan_max,
    nan_mean,
    rmse,
    Extrapolation,
};

pub use validation::{validate_range, validate_window, ValidationError, ValidationResult};
