// src/calibration/mod.rs
//! Sign calibration of anterior COP and shear force

pub mod sign_search;

pub use sign_search::{apply_signs, estimate_ankle_moment, search, EstimatorInputs, SignCalibration, SignPair};

use ndarray::Array1;

use crate::resampling::{PhaseFrame, PhaseResampler, SignalKind};
use crate::trial::naming::{joint_moment_column, Joint};
use crate::trial::{ChannelTable, Side};

/// Reference inverse-dynamics ankle moment of `side`, Nm/kg
///
/// Taken as-is from the reference table (no sign convention applied).
pub fn reference_ankle_moment(
    resampler: &PhaseResampler,
    frame: &PhaseFrame,
    table: Option<&ChannelTable>,
    side: Side,
    mass_kg: f64,
) -> Option<Array1<f64>> {
    let channel = table?.channel(&joint_moment_column(Joint::Ankle, side))?;
    Some(resampler.resample(frame, channel, SignalKind::Continuous) / mass_kg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResamplingMethod;

    #[test]
    fn test_reference_is_mass_normalized() {
        let header: Vec<f64> = (0..100).map(|i| i as f64 * 0.02).collect();
        let table = ChannelTable::new(header)
            .unwrap()
            .with_column("ankle_angle_l_moment", vec![-105.0; 100])
            .unwrap();
        let frame = PhaseFrame::new(0.1, 1.1).unwrap();
        let resampler = PhaseResampler::new(ResamplingMethod::DirectTime);
        let reference = reference_ankle_moment(&resampler, &frame, Some(&table), Side::Left, 70.0).unwrap();
        assert!(reference.iter().all(|&m| (m + 1.5).abs() < 1e-12));
        assert!(reference_ankle_moment(&resampler, &frame, Some(&table), Side::Right, 70.0).is_none());
        assert!(reference_ankle_moment(&resampler, &frame, None, Side::Left, 70.0).is_none());
    }
}
