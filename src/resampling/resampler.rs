// src/resampling/resampler.rs
//! Channel resampling onto a [`PhaseFrame`]
//!
//! Direct-time resampling interpolates each channel at the frame's 150 target
//! timestamps. The legacy two-stage method first interpolates the stride's
//! samples onto a uniform stride-local time grid, then maps that grid to
//! percent and interpolates onto the phase grid. The two differ near the
//! stride boundaries and for velocities.

use ndarray::Array1;

use super::PhaseFrame;
use crate::config::ResamplingMethod;
use crate::trial::ChannelView;
use crate::utils::numeric::{gradient, gradient_with_times, interp_many, linspace, Extrapolation};

/// How a channel behaves outside its sample support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Angles and moments: hold the boundary value
    Continuous,
    /// Plate forces and COP: no data outside the support
    Force,
}

impl SignalKind {
    fn extrapolation(self) -> Extrapolation {
        match self {
            SignalKind::Continuous => Extrapolation::Clamp,
            SignalKind::Force => Extrapolation::Nan,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PhaseResampler {
    method: ResamplingMethod,
}

impl PhaseResampler {
    pub fn new(method: ResamplingMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> ResamplingMethod {
        self.method
    }

    /// Resample one channel onto the frame
    pub fn resample(&self, frame: &PhaseFrame, channel: ChannelView<'_>, kind: SignalKind) -> Array1<f64> {
        self.resample_series(frame, channel.timestamps, channel.values, kind)
    }

    /// Resample raw `(timestamps, values)` onto the frame
    pub fn resample_series(&self, frame: &PhaseFrame, timestamps: &[f64], values: &[f64], kind: SignalKind) -> Array1<f64> {
        match self.method {
            ResamplingMethod::DirectTime => interp_many(frame.times(), timestamps, values, kind.extrapolation()),
            ResamplingMethod::LegacyTwoStage => two_stage(frame, timestamps, values, kind.extrapolation()),
        }
    }

    /// Velocity of an already resampled signal (units per second)
    ///
    /// Finite differences over the phase samples scaled by the frame's
    /// velocity scale.
    pub fn phase_velocity(&self, frame: &PhaseFrame, resampled: &Array1<f64>) -> Array1<f64> {
        gradient(resampled) * frame.velocity_scale()
    }

    /// Velocity computed at the source rate, then resampled
    pub fn source_velocity(&self, frame: &PhaseFrame, timestamps: &[f64], values: &[f64]) -> Array1<f64> {
        let rate = gradient_with_times(values, timestamps);
        self.resample_series(frame, timestamps, &rate, SignalKind::Continuous)
    }
}

/// Stride-local time, then time to percent, then the phase grid
///
/// The stride-local grid spans the first to the last sample inside the
/// window, so 0 % and 100 % always land on real data.
fn two_stage(frame: &PhaseFrame, timestamps: &[f64], values: &[f64], extrapolation: Extrapolation) -> Array1<f64> {
    let range = frame.window().index_range(timestamps);
    let n = range.len();
    match n {
        0 => return Array1::from_elem(frame.len(), f64::NAN),
        1 => return Array1::from_elem(frame.len(), values[range.start]),
        _ => {}
    }

    let local_times: Vec<f64> = timestamps[range.clone()].iter().map(|t| t - frame.start_time()).collect();
    let (first, last) = (local_times[0], local_times[n - 1]);
    let local_grid = linspace(first, last, n);
    let local_values = interp_many(&local_grid, &local_times, &values[range], extrapolation);

    let span = last - first;
    let percent: Vec<f64> = local_grid.iter().map(|t| (t - first) / span * 100.0).collect();
    let stage_one = local_values.to_vec();
    interp_many(frame.phase(), &percent, &stage_one, extrapolation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(n: usize, dt: f64, f: impl Fn(f64) -> f64) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let v = t.iter().map(|&x| f(x)).collect();
        (t, v)
    }

    #[test]
    fn test_direct_linear_signal_is_exact() {
        let (t, v) = series(200, 0.01, |x| 10.0 * x);
        let frame = PhaseFrame::new(0.2, 1.4).unwrap();
        let out = PhaseResampler::new(ResamplingMethod::DirectTime).resample_series(&frame, &t, &v, SignalKind::Continuous);
        assert_eq!(out.len(), 150);
        assert_relative_eq!(out[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(out[149], 14.0, epsilon = 1e-9);
    }

    #[test]
    fn test_force_outside_support_is_nan() {
        let (t, v) = series(50, 0.01, |_| 500.0);
        let frame = PhaseFrame::new(0.2, 1.0).unwrap();
        let out = PhaseResampler::new(ResamplingMethod::DirectTime).resample_series(&frame, &t, &v, SignalKind::Force);
        assert_eq!(out[0], 500.0);
        assert!(out[149].is_nan());

        let clamped =
            PhaseResampler::new(ResamplingMethod::DirectTime).resample_series(&frame, &t, &v, SignalKind::Continuous);
        assert_eq!(clamped[149], 500.0);
    }

    #[test]
    fn test_constant_signal_has_zero_velocity() {
        let (t, v) = series(300, 0.01, |_| 12.5);
        let frame = PhaseFrame::new(0.3, 1.5).unwrap();
        for method in [ResamplingMethod::DirectTime, ResamplingMethod::LegacyTwoStage] {
            let r = PhaseResampler::new(method);
            let angle = r.resample_series(&frame, &t, &v, SignalKind::Continuous);
            assert!(r.phase_velocity(&frame, &angle).iter().all(|x| x.abs() < 1e-9));
            assert!(r.source_velocity(&frame, &t, &v).iter().all(|x| x.abs() < 1e-9));
        }
    }

    #[test]
    fn test_phase_velocity_scale() {
        let (t, v) = series(300, 0.01, |x| 30.0 * x);
        let frame = PhaseFrame::new(0.0, 1.5).unwrap();
        let r = PhaseResampler::new(ResamplingMethod::DirectTime);
        let angle = r.resample_series(&frame, &t, &v, SignalKind::Continuous);
        let vel = r.phase_velocity(&frame, &angle);
        // per-sample step is 30 * 1.5 / 149, scaled by 150 / 1.5
        assert_relative_eq!(vel[75], 30.0 * 150.0 / 149.0, epsilon = 1e-6);
    }

    #[test]
    fn test_legacy_differs_from_direct_at_boundaries() {
        let (t, v) = series(300, 0.01, |x| (x * 4.0).sin());
        let frame = PhaseFrame::new(0.205, 1.405).unwrap();
        let direct =
            PhaseResampler::new(ResamplingMethod::DirectTime).resample_series(&frame, &t, &v, SignalKind::Continuous);
        let legacy =
            PhaseResampler::new(ResamplingMethod::LegacyTwoStage).resample_series(&frame, &t, &v, SignalKind::Continuous);
        assert_eq!(legacy.len(), 150);
        assert!((direct[0] - legacy[0]).abs() > 1e-6);
        assert!((direct[75] - legacy[75]).abs() < 0.05);
    }

    #[test]
    fn test_legacy_force_has_no_nan_between_plate_samples() {
        // plate clock offset by half a millisecond from the stride bounds
        let (t, v) = series(300, 0.005, |_| 600.0);
        let t: Vec<f64> = t.iter().map(|x| x + 0.0005).collect();
        let frame = PhaseFrame::new(0.3, 1.5).unwrap();
        let legacy =
            PhaseResampler::new(ResamplingMethod::LegacyTwoStage).resample_series(&frame, &t, &v, SignalKind::Force);
        assert!(legacy.iter().all(|x| *x == 600.0));
    }
}
