// src/force_plate/cop.rs
//! Body-weight GRF and ankle-frame center of pressure
//!
//! Forces are divided by `mass * g`. COP is the plate's pressure point minus
//! the resampled ankle marker, converted from mm to m, and zeroed wherever the
//! vertical GRF is below the contact threshold.

use ndarray::Array1;
use serde::Serialize;
use tracing::warn;

use super::PlateView;
use crate::config::constants::physics::{GRAVITY_M_S2, MM_PER_M};
use crate::config::{AxisMap, CopConfig, FillPolicy};
use crate::error::{GaitError, GaitErrorBuilder};
use crate::resampling::{PhaseFrame, PhaseResampler, SignalKind};
use crate::trial::naming::{marker_column, plate_cop_column, plate_force_column};
use crate::trial::{Axis, ChannelTable, ChannelView, Side, TableKind};

/// Ground reaction force in body-weight units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundReaction {
    pub vertical: Array1<f64>,
    pub anterior: Array1<f64>,
    pub lateral: Array1<f64>,
}

/// Center of pressure relative to the ankle, meters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterOfPressure {
    pub anterior: Array1<f64>,
    pub vertical: Array1<f64>,
    pub lateral: Array1<f64>,
}

impl CenterOfPressure {
    /// Zero every component where `vertical_bw < threshold_bw`
    ///
    /// NaN force samples leave the COP untouched.
    pub fn zero_below_contact(&mut self, vertical_bw: &Array1<f64>, threshold_bw: f64) {
        for (i, &f) in vertical_bw.iter().enumerate() {
            if f < threshold_bw {
                self.anterior[i] = 0.0;
                self.vertical[i] = 0.0;
                self.lateral[i] = 0.0;
            }
        }
    }
}

/// GRF and COP of one leg for one stride
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegLoad {
    pub plate: Option<String>,
    pub grf: GroundReaction,
    pub cop: CenterOfPressure,
}

impl LegLoad {
    /// Load of a leg with no assigned plate
    pub fn unresolved(len: usize, fill: FillPolicy) -> Self {
        let filled = || Array1::from_elem(len, fill.value());
        Self {
            plate: None,
            grf: GroundReaction {
                vertical: filled(),
                anterior: filled(),
                lateral: filled(),
            },
            cop: CenterOfPressure {
                anterior: filled(),
                vertical: filled(),
                lateral: filled(),
            },
        }
    }

    /// Output signals named `grf_<component>_<role>` and `cop_<component>_<role>`
    pub fn named(&self, role: &str) -> Vec<(String, Array1<f64>)> {
        vec![
            (format!("grf_vertical_{}", role), self.grf.vertical.clone()),
            (format!("grf_anterior_{}", role), self.grf.anterior.clone()),
            (format!("grf_lateral_{}", role), self.grf.lateral.clone()),
            (format!("cop_anterior_{}", role), self.cop.anterior.clone()),
            (format!("cop_vertical_{}", role), self.cop.vertical.clone()),
            (format!("cop_lateral_{}", role), self.cop.lateral.clone()),
        ]
    }
}

pub struct LoadCanonicalizer<'a> {
    resampler: PhaseResampler,
    plate_axes: AxisMap,
    marker_axes: AxisMap,
    config: &'a CopConfig,
    mass_kg: f64,
    fill: FillPolicy,
}

impl<'a> LoadCanonicalizer<'a> {
    pub fn new(
        resampler: PhaseResampler,
        plate_axes: AxisMap,
        marker_axes: AxisMap,
        config: &'a CopConfig,
        mass_kg: f64,
        fill: FillPolicy,
    ) -> Self {
        Self {
            resampler,
            plate_axes,
            marker_axes,
            config,
            mass_kg,
            fill,
        }
    }

    pub fn body_weight_n(&self) -> f64 {
        self.mass_kg * GRAVITY_M_S2
    }

    /// GRF and ankle-frame COP of `side` standing on `plate`
    pub fn leg_load(
        &self,
        frame: &PhaseFrame,
        plates: &ChannelTable,
        markers: Option<&ChannelTable>,
        plate: Option<&str>,
        side: Side,
    ) -> (LegLoad, Vec<GaitError>) {
        let mut missing = Vec::new();
        let Some(view) = plate.and_then(|id| PlateView::new(plates, id, self.plate_axes)) else {
            return (LegLoad::unresolved(frame.len(), self.fill), missing);
        };

        let mut plate_signal = |channel: Option<ChannelView<'_>>, name: String| match channel {
            Some(channel) => self.resampler.resample(frame, channel, SignalKind::Force),
            None => {
                warn!(channel = %name, "plate channel missing, filling");
                missing.push(GaitErrorBuilder::new("cop", "leg_load").missing_channel(TableKind::ForcePlates, &name));
                Array1::from_elem(frame.len(), self.fill.value())
            }
        };

        let bw = self.body_weight_n();
        let grf = GroundReaction {
            vertical: plate_signal(view.vertical_force(), plate_force_column(view.id, self.plate_axes.vertical)) / bw,
            anterior: plate_signal(view.anterior_force(), plate_force_column(view.id, self.plate_axes.anterior)) / bw,
            lateral: plate_signal(view.lateral_force(), plate_force_column(view.id, self.plate_axes.lateral)) / bw,
        };

        let p_anterior = plate_signal(view.cop_anterior(), plate_cop_column(view.id, self.plate_axes.anterior));
        let p_vertical = plate_signal(view.cop_vertical(), plate_cop_column(view.id, self.plate_axes.vertical));
        let p_lateral = plate_signal(view.cop_lateral(), plate_cop_column(view.id, self.plate_axes.lateral));

        let mut ankle = |axis: Axis| {
            let column = marker_column(side, &self.config.ankle_landmark, axis);
            match markers.and_then(|m| m.channel(&column)) {
                Some(channel) => self.resampler.resample(frame, channel, SignalKind::Continuous),
                None => {
                    warn!(channel = %column, "ankle marker missing, COP unresolved");
                    missing.push(GaitErrorBuilder::new("cop", "leg_load").missing_channel(TableKind::Markers, &column));
                    Array1::from_elem(frame.len(), self.fill.value())
                }
            }
        };

        let mut cop = CenterOfPressure {
            anterior: (p_anterior - ankle(self.marker_axes.anterior)) / MM_PER_M,
            vertical: (p_vertical - ankle(self.marker_axes.vertical)) / MM_PER_M,
            lateral: (p_lateral - ankle(self.marker_axes.lateral)) / MM_PER_M,
        };
        cop.zero_below_contact(&grf.vertical, self.config.contact_threshold_bw);

        (
            LegLoad {
                plate: Some(view.id.to_string()),
                grf,
                cop,
            },
            missing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResamplingMethod;

    const MASS: f64 = 70.0;

    fn tables() -> (ChannelTable, ChannelTable) {
        let n = 200;
        let header: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let bw = MASS * GRAVITY_M_S2;
        let vertical: Vec<f64> = header.iter().map(|&t| if t < 1.0 { bw } else { 0.1 * bw }).collect();
        let plates = ChannelTable::new(header.clone())
            .unwrap()
            .with_column("FP1_vy", vertical)
            .unwrap()
            .with_column("FP1_vz", vec![0.2 * bw; n])
            .unwrap()
            .with_column("FP1_vx", vec![0.0; n])
            .unwrap()
            .with_column("FP1_pz", vec![150.0; n])
            .unwrap()
            .with_column("FP1_py", vec![0.0; n])
            .unwrap()
            .with_column("FP1_px", vec![20.0; n])
            .unwrap();
        let markers = ChannelTable::new(header)
            .unwrap()
            .with_column("R_Ankle_z", vec![100.0; n])
            .unwrap()
            .with_column("R_Ankle_y", vec![80.0; n])
            .unwrap()
            .with_column("R_Ankle_x", vec![0.0; n])
            .unwrap();
        (plates, markers)
    }

    fn canonicalizer(config: &CopConfig) -> LoadCanonicalizer<'_> {
        LoadCanonicalizer::new(
            PhaseResampler::new(ResamplingMethod::DirectTime),
            AxisMap::default(),
            AxisMap::default(),
            config,
            MASS,
            FillPolicy::Nan,
        )
    }

    #[test]
    fn test_grf_in_body_weight_and_cop_in_ankle_frame() {
        let (plates, markers) = tables();
        let config = CopConfig::default();
        let frame = PhaseFrame::new(0.2, 1.4).unwrap();
        let (load, missing) = canonicalizer(&config).leg_load(&frame, &plates, Some(&markers), Some("FP1"), Side::Right);
        assert!(missing.is_empty());
        assert!((load.grf.vertical[0] - 1.0).abs() < 1e-12);
        assert!((load.grf.anterior[10] - 0.2).abs() < 1e-12);
        assert!((load.cop.anterior[0] - 0.05).abs() < 1e-12);
        assert!((load.cop.vertical[0] + 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_cop_zeroed_below_contact() {
        let (plates, markers) = tables();
        let config = CopConfig::default();
        let frame = PhaseFrame::new(0.2, 1.4).unwrap();
        let (load, _) = canonicalizer(&config).leg_load(&frame, &plates, Some(&markers), Some("FP1"), Side::Right);
        for i in 0..frame.len() {
            if load.grf.vertical[i] < 0.2 {
                assert_eq!(load.cop.anterior[i], 0.0);
                assert_eq!(load.cop.vertical[i], 0.0);
                assert_eq!(load.cop.lateral[i], 0.0);
            }
        }
        assert_eq!(load.cop.anterior[149], 0.0);
    }

    #[test]
    fn test_unassigned_plate_is_unresolved() {
        let (plates, markers) = tables();
        let config = CopConfig::default();
        let frame = PhaseFrame::new(0.2, 1.4).unwrap();
        let (load, _) = canonicalizer(&config).leg_load(&frame, &plates, Some(&markers), None, Side::Right);
        assert!(load.plate.is_none());
        assert!(load.grf.vertical.iter().all(|v| v.is_nan()));
        assert!(load.cop.anterior.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_missing_marker_reports_channel() {
        let (plates, _) = tables();
        let config = CopConfig::default();
        let frame = PhaseFrame::new(0.2, 1.4).unwrap();
        let (load, missing) = canonicalizer(&config).leg_load(&frame, &plates, None, Some("FP1"), Side::Right);
        assert_eq!(missing.len(), 3);
        assert!((load.grf.vertical[0] - 1.0).abs() < 1e-12);
    }
}
