// src/force_plate/swap.rs
//! Ipsi/contra swap plausibility check
//!
//! The ipsilateral foot is in stance right after its own heel strike and in
//! swing near the end of the stride. A vertical GRF that is high in late
//! swing, relative to early stance, means the plates were assigned to the
//! wrong legs.

use ndarray::Array1;
use serde::Serialize;

use crate::config::SwapConfig;
use crate::utils::numeric::{masked, nan_mean, window_mask};

/// Outcome of the swap check for one stride
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwapCheck {
    /// Mean ipsi vertical GRF in early stance (BW)
    pub early_stance_bw: Option<f64>,
    /// Mean ipsi vertical GRF in late swing (BW)
    pub late_swing_bw: Option<f64>,
    pub swapped: bool,
}

/// Check the ipsi vertical GRF (BW units) for a swapped assignment
pub fn check_swap(phase: &Array1<f64>, ipsi_vertical_bw: &Array1<f64>, config: &SwapConfig) -> SwapCheck {
    let early_mask = window_mask(phase, config.early_stance_percent);
    let late_mask = window_mask(phase, config.late_swing_percent);
    let early_stance_bw = nan_mean(masked(ipsi_vertical_bw, &early_mask));
    let late_swing_bw = nan_mean(masked(ipsi_vertical_bw, &late_mask));

    let swapped = match (early_stance_bw, late_swing_bw) {
        (Some(early), Some(late)) => late > config.min_late_swing_bw && late > config.late_to_early_ratio * early,
        _ => false,
    };

    SwapCheck {
        early_stance_bw,
        late_swing_bw,
        swapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::numeric::linspace;

    fn grf(f: impl Fn(f64) -> f64) -> (Array1<f64>, Array1<f64>) {
        let phase = linspace(0.0, 100.0, 150);
        let force = phase.mapv(f);
        (phase, force)
    }

    #[test]
    fn test_stance_then_swing_is_not_swapped() {
        let (phase, force) = grf(|p| if p < 60.0 { 1.0 } else { 0.0 });
        let check = check_swap(&phase, &force, &SwapConfig::default());
        assert!(!check.swapped);
        assert_eq!(check.early_stance_bw, Some(1.0));
    }

    #[test]
    fn test_late_loading_is_swapped() {
        let (phase, force) = grf(|p| if p > 50.0 { 1.0 } else { 0.1 });
        assert!(check_swap(&phase, &force, &SwapConfig::default()).swapped);
    }

    #[test]
    fn test_both_conditions_required() {
        // late above 0.3 BW but below half of early stance
        let (phase, force) = grf(|p| if p < 60.0 { 1.0 } else { 0.4 });
        assert!(!check_swap(&phase, &force, &SwapConfig::default()).swapped);
        // late above half of a tiny early stance but below 0.3 BW
        let (phase, force) = grf(|p| if p < 60.0 { 0.1 } else { 0.2 });
        assert!(!check_swap(&phase, &force, &SwapConfig::default()).swapped);
    }

    #[test]
    fn test_unresolved_grf_is_not_swapped() {
        let (phase, force) = grf(|_| f64::NAN);
        let check = check_swap(&phase, &force, &SwapConfig::default());
        assert!(!check.swapped);
        assert!(check.late_swing_bw.is_none());
    }
}
