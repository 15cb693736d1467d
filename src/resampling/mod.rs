// src/resampling/mod.rs
//! Time-to-phase resampling onto the fixed 150-point stride grid

pub mod resampler;

pub use resampler::{PhaseResampler, SignalKind};

use ndarray::Array1;
use serde::Serialize;

use crate::config::constants::phase;
use crate::error::{GaitErrorBuilder, GaitResult};
use crate::segmentation::Stride;
use crate::trial::TimeWindow;
use crate::utils::numeric::linspace;

/// Phase grid of one stride
///
/// Holds the 150 phase values over `[0, 100]` and the matching target
/// timestamps over `[start_time, end_time]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseFrame {
    start_time: f64,
    end_time: f64,
    phase: Array1<f64>,
    times: Array1<f64>,
}

impl PhaseFrame {
    pub fn new(start_time: f64, end_time: f64) -> GaitResult<Self> {
        if !start_time.is_finite() || !end_time.is_finite() || end_time <= start_time {
            return Err(GaitErrorBuilder::new("phase_frame", "new").invalid_data_with(
                "stride window",
                "end must follow start",
                "end_time > start_time".to_string(),
                format!("[{}, {}]", start_time, end_time),
            ));
        }

        Ok(Self {
            start_time,
            end_time,
            phase: linspace(phase::START_PERCENT, phase::END_PERCENT, phase::NUM_POINTS),
            times: linspace(start_time, end_time, phase::NUM_POINTS),
        })
    }

    pub fn for_stride(stride: &Stride) -> GaitResult<Self> {
        Self::new(stride.start_time, stride.end_time)
    }

    pub fn phase(&self) -> &Array1<f64> {
        &self.phase
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Phase advance per second (%/s)
    pub fn phase_rate(&self) -> f64 {
        (phase::END_PERCENT - phase::START_PERCENT) / self.duration()
    }

    /// Scale turning a per-sample finite difference into a per-second rate
    pub fn velocity_scale(&self) -> f64 {
        phase::NUM_POINTS as f64 / self.duration()
    }

    pub fn len(&self) -> usize {
        self.phase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phase.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_grid() {
        let frame = PhaseFrame::new(0.0, 1.2).unwrap();
        assert_eq!(frame.len(), 150);
        assert_eq!(frame.phase()[0], 0.0);
        assert_eq!(frame.phase()[149], 100.0);
        assert_eq!(frame.times()[149], 1.2);
        assert!(frame.phase().windows(2).into_iter().all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_phase_rate() {
        let frame = PhaseFrame::new(0.0, 1.2).unwrap();
        assert_relative_eq!(frame.phase_rate(), 83.333_333, epsilon = 1e-5);
        assert!((frame.phase_rate() * frame.duration() - 100.0).abs() < phase::RATE_TOLERANCE);
    }

    #[test]
    fn test_rejects_empty_window() {
        assert!(PhaseFrame::new(1.0, 1.0).is_err());
        assert!(PhaseFrame::new(f64::NAN, 1.0).is_err());
    }
}
