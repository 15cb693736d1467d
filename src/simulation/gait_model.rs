// src/simulation/gait_model.rs
//! Idealized per-leg gait waveforms as functions of gait percent
//!
//! Stance spans 0..60 % of the cycle. Forces are in body weights, COP in
//! meters relative to the ankle, angles in degrees, moments in Nm/kg.

use std::f64::consts::PI;

use crate::config::constants::physics::GRAVITY_M_S2;

pub const STANCE_PERCENT: f64 = 60.0;
/// Ankle height above the walking surface during stance
pub const ANKLE_HEIGHT_MM: f64 = 80.0;
/// Heel height above the walking surface during stance
pub const HEEL_HEIGHT_MM: f64 = 20.0;
const SWING_LIFT_MM: f64 = 80.0;
const COP_CONTACT_BW: f64 = 0.2;

pub fn in_stance(p: f64) -> bool {
    (0.0..STANCE_PERCENT).contains(&p)
}

/// Fraction of swing completed, 0 outside swing
pub fn swing_fraction(p: f64) -> f64 {
    if in_stance(p) {
        0.0
    } else {
        (p - STANCE_PERCENT) / (100.0 - STANCE_PERCENT)
    }
}

pub fn vertical_force_bw(p: f64) -> f64 {
    if in_stance(p) {
        1.1 * (PI * p / STANCE_PERCENT).sin()
    } else {
        0.0
    }
}

/// Braking then propulsion
pub fn anterior_force_bw(p: f64) -> f64 {
    if in_stance(p) {
        -0.2 * (2.0 * PI * p / STANCE_PERCENT).sin()
    } else {
        0.0
    }
}

pub fn lateral_force_bw(p: f64) -> f64 {
    if in_stance(p) {
        0.05 * (PI * p / STANCE_PERCENT).sin()
    } else {
        0.0
    }
}

/// Heel-to-toe roll-over
pub fn cop_anterior_m(p: f64) -> f64 {
    if in_stance(p) {
        -0.05 + 0.2 * p / STANCE_PERCENT
    } else {
        0.0
    }
}

pub fn cop_vertical_m() -> f64 {
    -ANKLE_HEIGHT_MM / 1000.0
}

/// Ankle moment produced by the plate loads, Nm/kg
///
/// COP terms vanish below the contact threshold, as in the canonical COP.
pub fn ankle_moment(p: f64) -> f64 {
    let vertical = vertical_force_bw(p);
    if vertical < COP_CONTACT_BW {
        return 0.0;
    }
    (-cop_anterior_m(p) * vertical + cop_vertical_m() * anterior_force_bw(p)) * GRAVITY_M_S2
}

pub fn hip_moment(p: f64) -> f64 {
    0.8 * (2.0 * PI * p / 100.0).cos()
}

/// Source convention, extension positive
pub fn knee_moment(p: f64) -> f64 {
    0.4 * (2.0 * PI * p / 100.0).sin()
}

pub fn hip_flexion_deg(p: f64) -> f64 {
    10.0 + 25.0 * (2.0 * PI * p / 100.0).cos()
}

/// Source convention, flexion positive
pub fn knee_angle_deg(p: f64) -> f64 {
    let stance = 15.0 * (PI * p / STANCE_PERCENT).sin().max(0.0);
    let swing = 50.0 * (PI * swing_fraction(p)).sin();
    5.0 + if in_stance(p) { stance } else { swing }
}

pub fn ankle_angle_deg(p: f64) -> f64 {
    5.0 * (2.0 * PI * p / 100.0).sin()
}

/// Pelvis oscillates twice per gait cycle
pub fn pelvis_tilt_deg(p: f64) -> f64 {
    5.0 + 2.0 * (4.0 * PI * p / 100.0).sin()
}

pub fn lumbar_extension_deg(p: f64) -> f64 {
    -3.0 + (4.0 * PI * p / 100.0).cos()
}

/// Heel height above the current walking surface
pub fn heel_height_mm(p: f64) -> f64 {
    HEEL_HEIGHT_MM + SWING_LIFT_MM * (PI * swing_fraction(p)).sin()
}

/// Ankle height above the current walking surface
pub fn ankle_height_mm(p: f64) -> f64 {
    ANKLE_HEIGHT_MM + SWING_LIFT_MM * (PI * swing_fraction(p)).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forces_vanish_in_swing() {
        for p in [60.0, 75.0, 99.9] {
            assert_eq!(vertical_force_bw(p), 0.0);
            assert_eq!(anterior_force_bw(p), 0.0);
            assert_eq!(ankle_moment(p), 0.0);
        }
        assert_relative_eq!(vertical_force_bw(30.0), 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_heel_is_lowest_in_stance() {
        assert_eq!(heel_height_mm(10.0), HEEL_HEIGHT_MM);
        assert!(heel_height_mm(80.0) > HEEL_HEIGHT_MM + 50.0);
    }
}
