// src/calibration/sign_search.rs
//! Exhaustive COP/shear sign search against an inverse-dynamics reference
//!
//! The ankle moment estimate is
//!
//! ```text
//! tau = (-sign_a * COP_ant * GRF_vert + COP_vert * sign_g * GRF_ant) * g
//! ```
//!
//! with COP in meters, GRF in body weights and `tau` in Nm/kg. The four
//! `(sign_a, sign_g)` pairs are tried with the unflipped pair first; a later
//! pair replaces the current best only when strictly better.

use std::fmt;

use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

use crate::config::constants::physics::GRAVITY_M_S2;
use crate::force_plate::LegLoad;
use crate::utils::numeric::rmse;

/// Sign applied to anterior COP and to anterior GRF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignPair {
    /// (+1, +1)
    Unflipped,
    /// (+1, -1)
    FlipShear,
    /// (-1, +1)
    FlipCop,
    /// (-1, -1)
    FlipBoth,
}

impl SignPair {
    /// Search order; the unflipped baseline comes first
    pub const ALL: [SignPair; 4] = [SignPair::Unflipped, SignPair::FlipShear, SignPair::FlipCop, SignPair::FlipBoth];

    pub fn from_signs(sign_a: f64, sign_g: f64) -> Self {
        match (sign_a >= 0.0, sign_g >= 0.0) {
            (true, true) => SignPair::Unflipped,
            (true, false) => SignPair::FlipShear,
            (false, true) => SignPair::FlipCop,
            (false, false) => SignPair::FlipBoth,
        }
    }

    /// Sign applied to the anterior COP
    pub fn sign_a(self) -> f64 {
        match self {
            SignPair::Unflipped | SignPair::FlipShear => 1.0,
            SignPair::FlipCop | SignPair::FlipBoth => -1.0,
        }
    }

    /// Sign applied to the anterior GRF
    pub fn sign_g(self) -> f64 {
        match self {
            SignPair::Unflipped | SignPair::FlipCop => 1.0,
            SignPair::FlipShear | SignPair::FlipBoth => -1.0,
        }
    }
}

impl fmt::Display for SignPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+})", self.sign_a() as i8, self.sign_g() as i8)
    }
}

/// Winning sign pair of one stride and its fit quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignCalibration {
    pub pair: SignPair,
    /// RMSE of the chosen pair (Nm/kg)
    pub rmse: f64,
    /// RMSE of the unflipped pair (Nm/kg)
    pub baseline_rmse: f64,
}

/// Signals entering the estimator
#[derive(Debug, Clone, Copy)]
pub struct EstimatorInputs<'a> {
    pub cop_anterior: &'a Array1<f64>,
    pub cop_vertical: &'a Array1<f64>,
    pub grf_vertical: &'a Array1<f64>,
    pub grf_anterior: &'a Array1<f64>,
}

impl<'a> EstimatorInputs<'a> {
    pub fn from_load(load: &'a LegLoad) -> Self {
        Self {
            cop_anterior: &load.cop.anterior,
            cop_vertical: &load.cop.vertical,
            grf_vertical: &load.grf.vertical,
            grf_anterior: &load.grf.anterior,
        }
    }
}

/// Ankle moment estimate for one sign pair (Nm/kg)
pub fn estimate_ankle_moment(inputs: EstimatorInputs<'_>, pair: SignPair) -> Array1<f64> {
    let (a, g) = (pair.sign_a(), pair.sign_g());
    Zip::from(inputs.cop_anterior)
        .and(inputs.cop_vertical)
        .and(inputs.grf_vertical)
        .and(inputs.grf_anterior)
        .map_collect(|&cop_ant, &cop_vert, &grf_vert, &grf_ant| {
            (-a * cop_ant * grf_vert + cop_vert * g * grf_ant) * GRAVITY_M_S2
        })
}

/// Try all four sign pairs and keep the lowest RMSE
///
/// `None` when no sample pair is finite for the baseline, so no fit exists.
pub fn search(inputs: EstimatorInputs<'_>, reference: &Array1<f64>) -> Option<SignCalibration> {
    let baseline_rmse = rmse(&estimate_ankle_moment(inputs, SignPair::Unflipped), reference)?;

    let mut best = SignCalibration {
        pair: SignPair::Unflipped,
        rmse: baseline_rmse,
        baseline_rmse,
    };
    for pair in SignPair::ALL.into_iter().skip(1) {
        if let Some(candidate) = rmse(&estimate_ankle_moment(inputs, pair), reference) {
            if candidate < best.rmse {
                best.pair = pair;
                best.rmse = candidate;
            }
        }
    }
    Some(best)
}

/// Multiply the stored anterior COP and anterior GRF by the chosen signs
pub fn apply_signs(load: &mut LegLoad, pair: SignPair) {
    let (a, g) = (pair.sign_a(), pair.sign_g());
    load.cop.anterior.mapv_inplace(|v| v * a);
    load.grf.anterior.mapv_inplace(|v| v * g);
}
