// src/utils/numeric.rs
//! Numeric helpers shared by the resampler, plate heuristics and calibration
//!
//! All helpers treat NaN as "no data": NaN inputs propagate through
//! interpolation and are skipped by the `nan_*` reductions.

use ndarray::Array1;

/// How to treat query points outside the sample support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// Hold the first/last sample value
    Clamp,
    /// Return NaN
    Nan,
}

/// `n` equally spaced values over `[start, end]`, endpoints exact
pub fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    let mut out = Array1::linspace(start, end, n);
    if n > 0 {
        out[n - 1] = end;
    }
    out
}

/// Linear interpolation of `(xp, fp)` at `x`
///
/// `xp` must be increasing. NaN samples in `fp` make their neighbourhood NaN.
pub fn interp(x: f64, xp: &[f64], fp: &[f64], extrapolation: Extrapolation) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return if x == xp[0] || extrapolation == Extrapolation::Clamp { fp[0] } else { f64::NAN };
    }
    if x >= xp[n - 1] {
        return if x == xp[n - 1] || extrapolation == Extrapolation::Clamp { fp[n - 1] } else { f64::NAN };
    }

    let hi = xp[..n].partition_point(|&v| v <= x);
    let lo = hi - 1;
    if xp[lo] == x {
        return fp[lo];
    }
    let w = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + w * (fp[hi] - fp[lo])
}

/// Interpolate a whole series at every query point
pub fn interp_many(xs: &Array1<f64>, xp: &[f64], fp: &[f64], extrapolation: Extrapolation) -> Array1<f64> {
    xs.mapv(|x| interp(x, xp, fp, extrapolation))
}

/// Unit-spacing gradient: central differences inside, one-sided at the ends
pub fn gradient(values: &Array1<f64>) -> Array1<f64> {
    let n = values.len();
    let mut out = Array1::zeros(n);
    match n {
        0 => {}
        1 => out[0] = 0.0,
        _ => {
            out[0] = values[1] - values[0];
            out[n - 1] = values[n - 1] - values[n - 2];
            for i in 1..n - 1 {
                out[i] = (values[i + 1] - values[i - 1]) / 2.0;
            }
        }
    }
    out
}

/// Gradient over non-uniform sample times
pub fn gradient_with_times(values: &[f64], times: &[f64]) -> Vec<f64> {
    let n = values.len().min(times.len());
    let mut out = vec![0.0; n];
    if n < 2 {
        return out;
    }
    out[0] = (values[1] - values[0]) / (times[1] - times[0]);
    out[n - 1] = (values[n - 1] - values[n - 2]) / (times[n - 1] - times[n - 2]);
    for i in 1..n - 1 {
        out[i] = (values[i + 1] - values[i - 1]) / (times[i + 1] - times[i - 1]);
    }
    out
}

/// Maximum ignoring NaN; `None` when no finite value exists
pub fn nan_max<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<f64> {
    values
        .into_iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

/// Mean ignoring NaN; `None` when no finite value exists
pub fn nan_mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Root-mean-square error over sample pairs where both values are finite
pub fn rmse(estimate: &Array1<f64>, reference: &Array1<f64>) -> Option<f64> {
    let (sum, count) = estimate
        .iter()
        .zip(reference.iter())
        .filter(|(e, r)| e.is_finite() && r.is_finite())
        .fold((0.0, 0usize), |(s, c), (e, r)| (s + (e - r).powi(2), c + 1));
    (count > 0).then(|| (sum / count as f64).sqrt())
}

/// Boolean mask of phase samples inside the inclusive percent window
pub fn window_mask(phase: &Array1<f64>, window: (f64, f64)) -> Vec<bool> {
    phase.iter().map(|&p| p >= window.0 && p <= window.1).collect()
}

/// Values of `signal` selected by `mask`
pub fn masked<'a>(signal: &'a Array1<f64>, mask: &'a [bool]) -> impl Iterator<Item = &'a f64> + 'a {
    signal.iter().zip(mask.iter()).filter(|(_, m)| **m).map(|(v, _)| v)
}
