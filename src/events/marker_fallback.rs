// src/events/marker_fallback.rs
//! Heel-strike detection from heel-marker vertical velocity
//!
//! Used when a trial has no gait-cycle table for a leg. A heel strike is the
//! sample where the heel's vertical velocity crosses from negative to
//! non-negative, provided the heel was descending faster than the swing
//! threshold shortly before and is within the stance height band.

use crate::config::EventConfig;
use crate::utils::numeric::gradient_with_times;

/// Heel-strike indices into `header`
pub fn detect_heel_strikes(header: &[f64], heel_height_mm: &[f64], config: &EventConfig) -> Vec<usize> {
    let n = header.len().min(heel_height_mm.len());
    if n < 3 {
        return Vec::new();
    }

    let velocity = gradient_with_times(&heel_height_mm[..n], &header[..n]);
    let min_height = heel_height_mm[..n]
        .iter()
        .copied()
        .filter(|h| h.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !min_height.is_finite() {
        return Vec::new();
    }

    let mean_dt = (header[n - 1] - header[0]) / (n - 1) as f64;
    let lookback = ((config.swing_lookback_s / mean_dt).ceil() as usize).max(1);

    let candidates = (1..n).filter(|&i| {
        let crossing = velocity[i - 1] < 0.0 && velocity[i] >= 0.0;
        let near_ground = heel_height_mm[i] <= min_height + config.stance_height_threshold_mm;
        let swung = velocity[i.saturating_sub(lookback)..i]
            .iter()
            .any(|&v| v < -config.swing_velocity_threshold_mm_s);
        crossing && near_ground && swung
    });

    deduplicate(header, candidates, config.min_event_interval_s)
}

/// Keep the first event of any cluster closer than `min_interval_s`
fn deduplicate(header: &[f64], candidates: impl Iterator<Item = usize>, min_interval_s: f64) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for i in candidates {
        match kept.last() {
            Some(&last) if header[i] - header[last] < min_interval_s => {}
            _ => kept.push(i),
        }
    }
    kept
}

/// Gait percent implied by consecutive heel strikes
///
/// Linear 0..100 between strikes, exactly 0 at each strike, NaN before the
/// first and after the last strike.
pub fn synthesize_gait_percent(header: &[f64], heel_strikes: &[usize]) -> Vec<f64> {
    let mut percent = vec![f64::NAN; header.len()];
    for pair in heel_strikes.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let duration = header[b] - header[a];
        for i in a..b {
            percent[i] = (header[i] - header[a]) / duration * 100.0;
        }
    }
    if let Some(&last) = heel_strikes.last() {
        percent[last] = 0.0;
    }
    percent
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Heel height with contacts every `period` seconds, 100 Hz
    fn heel_trace(period: f64, duration: f64) -> (Vec<f64>, Vec<f64>) {
        let dt = 0.01;
        let n = (duration / dt) as usize;
        let header: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let height = header
            .iter()
            .map(|&t| {
                let p = (t % period) / period;
                if p < 0.6 {
                    20.0
                } else {
                    20.0 + 80.0 * (std::f64::consts::PI * (p - 0.6) / 0.4).sin()
                }
            })
            .collect();
        (header, height)
    }

    #[test]
    fn test_detects_one_strike_per_cycle() {
        let (header, height) = heel_trace(1.0, 5.0);
        let strikes = detect_heel_strikes(&header, &height, &EventConfig::default());
        assert_eq!(strikes.len(), 4);
        for pair in strikes.windows(2) {
            let interval = header[pair[1]] - header[pair[0]];
            assert!((interval - 1.0).abs() < 0.03, "interval {}", interval);
        }
    }

    #[test]
    fn test_deduplicates_close_events() {
        let header: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let kept = deduplicate(&header, vec![10, 20, 70, 75].into_iter(), 0.5);
        assert_eq!(kept, vec![10, 70]);
    }

    #[test]
    fn test_flat_trace_has_no_strikes() {
        let header: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let height = vec![20.0; 200];
        assert!(detect_heel_strikes(&header, &height, &EventConfig::default()).is_empty());
    }

    #[test]
    fn test_synthesized_percent() {
        let header: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let percent = synthesize_gait_percent(&header, &[1, 5]);
        assert!(percent[0].is_nan());
        assert_eq!(percent[1], 0.0);
        assert_eq!(percent[3], 50.0);
        assert_eq!(percent[4], 75.0);
        assert_eq!(percent[5], 0.0);
    }
}
