// src/segmentation/segmenter.rs
//! Ipsilateral leg selection and stride enumeration

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SegmentationConfig;
use crate::error::{GaitError, GaitErrorBuilder, GaitResult};
use crate::events::{GaitEvent, GaitEventTrack};
use crate::trial::{ChannelView, Side, SideMap, TimeWindow};
use crate::utils::numeric::{nan_max, nan_mean};

/// One gait cycle of the ipsilateral leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stride {
    pub side: Side,
    pub start_time: f64,
    pub end_time: f64,
    /// Heel-strike sample indices in the gait-percent header
    pub start_index: usize,
    pub end_index: usize,
}

impl Stride {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// Belt-speed channel and the nominal speed it should match
#[derive(Debug, Clone, Copy)]
pub struct SpeedReference<'a> {
    pub channel: ChannelView<'a>,
    pub nominal_m_s: f64,
}

/// Strides accepted and rejected within one trial segment
#[derive(Debug, Clone)]
pub struct SegmentStrides {
    pub ipsi: Side,
    pub strides: Vec<Stride>,
    pub rejected: Vec<GaitError>,
}

/// Pick the ipsilateral leg for a segment
///
/// The leg whose first heel strike inside the window comes earlier wins.
/// Equal times go to the right leg. `None` when neither leg has a strike.
pub fn choose_leg(events_right: &[GaitEvent], events_left: &[GaitEvent], window: TimeWindow) -> Option<Side> {
    let first = |events: &[GaitEvent]| {
        events
            .iter()
            .map(|e| e.timestamp)
            .filter(|t| t.is_finite() && window.contains(*t))
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.min(t))))
    };

    match (first(events_right), first(events_left)) {
        (Some(r), Some(l)) => Some(if l < r { Side::Left } else { Side::Right }),
        (Some(_), None) => Some(Side::Right),
        (None, Some(_)) => Some(Side::Left),
        (None, None) => None,
    }
}

/// Enumerates valid strides of the ipsilateral leg
pub struct StrideSegmenter {
    config: SegmentationConfig,
}

impl StrideSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Select the ipsilateral leg and enumerate its strides inside `window`
    ///
    /// `signal_headers` are the timestamp columns of the kinematic/kinetic
    /// tables; every stride needs enough samples in each of them.
    pub fn segment(
        &self,
        tracks: &SideMap<Option<GaitEventTrack>>,
        window: TimeWindow,
        signal_headers: &[&[f64]],
        speed: Option<SpeedReference<'_>>,
    ) -> GaitResult<SegmentStrides> {
        let events = SideMap::from_fn(|side| tracks.get(side).as_ref().map(|t| t.events()).unwrap_or_default());

        let ipsi = choose_leg(&events.right, &events.left, window)
            .ok_or_else(|| GaitErrorBuilder::new("segmenter", "choose_leg").no_heel_strike(window.start, window.end))?;
        let track = tracks
            .get(ipsi)
            .as_ref()
            .ok_or_else(|| GaitErrorBuilder::new("segmenter", "segment").no_heel_strike(window.start, window.end))?;

        let strikes = track.strikes_in(window);
        debug!(side = %ipsi, strikes = strikes.len(), "ipsilateral leg selected");

        let mut strides = Vec::new();
        let mut rejected = Vec::new();
        for pair in strikes.windows(2) {
            let stride = Stride {
                side: ipsi,
                start_time: track.header[pair[0]],
                end_time: track.header[pair[1]],
                start_index: pair[0],
                end_index: pair[1],
            };
            match self.validate(&stride, track, signal_headers, speed) {
                Ok(()) => strides.push(stride),
                Err(err) => {
                    warn!(side = %ipsi, start = stride.start_time, end = stride.end_time, error = %err, "stride rejected");
                    rejected.push(err);
                }
            }
        }

        Ok(SegmentStrides { ipsi, strides, rejected })
    }

    /// Check a candidate stride against the acceptance rules
    ///
    /// Gait-percent samples run from the strike sample up to, but excluding,
    /// the sample before the next strike.
    fn validate(
        &self,
        stride: &Stride,
        track: &GaitEventTrack,
        signal_headers: &[&[f64]],
        speed: Option<SpeedReference<'_>>,
    ) -> GaitResult<()> {
        let reject = |reason: String| {
            GaitErrorBuilder::new("segmenter", "validate_stride").insufficient_stride(
                stride.side,
                stride.start_time,
                stride.end_time,
                &reason,
            )
        };

        if stride.duration() <= 0.0 {
            return Err(reject("stride end does not follow its start".to_string()));
        }

        let last = stride.end_index.saturating_sub(2);
        let percent: &[f64] = if last >= stride.start_index {
            &track.percent[stride.start_index..=last]
        } else {
            &[]
        };
        if percent.len() < self.config.min_gait_percent_samples {
            return Err(reject(format!("only {} gait-percent samples", percent.len())));
        }
        match nan_max(percent) {
            Some(peak) if peak >= self.config.min_peak_gait_percent => {}
            peak => {
                return Err(reject(format!(
                    "peak gait percent {:?} below {}",
                    peak, self.config.min_peak_gait_percent
                )))
            }
        }

        for header in signal_headers {
            let window = stride.window().index_range(header);
            if window.len() < self.config.min_signal_samples {
                return Err(reject(format!("only {} signal samples in stride", window.len())));
            }
        }

        if let Some(speed) = speed {
            let range = stride.window().index_range(speed.channel.timestamps);
            if let Some(mean_speed) = nan_mean(&speed.channel.values[range]) {
                if (mean_speed - speed.nominal_m_s).abs() > self.config.speed_tolerance {
                    return Err(reject(format!(
                        "mean belt speed {:.3} m/s outside tolerance of nominal {:.3} m/s",
                        mean_speed, speed.nominal_m_s
                    )));
                }
            }
        }

        Ok(())
    }
}
