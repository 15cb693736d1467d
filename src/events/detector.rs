// src/events/detector.rs
//! Heel-strike detection from gait-cycle percent channels

use std::ops::Range;

use serde::Serialize;
use tracing::{debug, warn};

use super::marker_fallback;
use crate::config::EventConfig;
use crate::error::{GaitErrorBuilder, GaitResult};
use crate::trial::naming::{marker_column, HEEL_STRIKE_COLUMN};
use crate::trial::{RawTrial, Side, TableKind, TimeWindow};

/// A single heel strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaitEvent {
    pub side: Side,
    pub timestamp: f64,
}

/// Where a track's events came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventSource {
    GaitCycleTable,
    MarkerVelocity,
}

/// Gait-percent samples and heel-strike indices of one leg
#[derive(Debug, Clone, PartialEq)]
pub struct GaitEventTrack {
    pub side: Side,
    pub source: EventSource,
    pub header: Vec<f64>,
    pub percent: Vec<f64>,
    /// Indices into `header` of heel-strike samples, increasing
    pub heel_strikes: Vec<usize>,
}

impl GaitEventTrack {
    pub fn events(&self) -> Vec<GaitEvent> {
        self.heel_strikes
            .iter()
            .map(|&i| GaitEvent {
                side: self.side,
                timestamp: self.header[i],
            })
            .collect()
    }

    /// Heel-strike indices whose timestamps fall inside the window
    pub fn strikes_in(&self, window: TimeWindow) -> Vec<usize> {
        self.heel_strikes
            .iter()
            .copied()
            .filter(|&i| window.contains(self.header[i]))
            .collect()
    }

    /// Time of the first heel strike inside the window
    pub fn first_strike_in(&self, window: TimeWindow) -> Option<f64> {
        self.heel_strikes
            .iter()
            .map(|&i| self.header[i])
            .find(|&t| window.contains(t))
    }
}

/// Falling edges of a gait-percent (or boolean) channel inside `window`
///
/// A heel strike is a sample whose value is 0 while the previous sample is
/// high (> 0). The first sample of the channel is never an edge.
pub fn falling_edges(percent: &[f64], window: Range<usize>) -> Vec<usize> {
    let start = window.start.max(1);
    let end = window.end.min(percent.len());
    (start..end)
        .filter(|&i| percent[i - 1] > 0.0 && percent[i] == 0.0)
        .collect()
}

/// Detects heel strikes per leg from the best available source
pub struct HeelStrikeDetector {
    config: EventConfig,
}

impl HeelStrikeDetector {
    pub fn new(config: EventConfig) -> Self {
        Self { config }
    }

    /// Build the event track of one leg
    ///
    /// Uses the leg's gait-cycle table when present, otherwise the heel-marker
    /// vertical velocity if the fallback is enabled.
    pub fn detect(&self, trial: &RawTrial, side: Side) -> GaitResult<GaitEventTrack> {
        if let Some(table) = trial.table(TableKind::GaitCycle(side)) {
            let percent = table.column(HEEL_STRIKE_COLUMN).ok_or_else(|| {
                GaitErrorBuilder::new("detector", "detect").missing_channel(TableKind::GaitCycle(side), HEEL_STRIKE_COLUMN)
            })?;
            let heel_strikes = falling_edges(percent, 0..percent.len());
            debug!(trial = %trial.id(), %side, count = heel_strikes.len(), "heel strikes from gait-cycle table");
            return Ok(GaitEventTrack {
                side,
                source: EventSource::GaitCycleTable,
                header: table.header().to_vec(),
                percent: percent.to_vec(),
                heel_strikes,
            });
        }

        if !self.config.marker_fallback {
            return Err(GaitErrorBuilder::new("detector", "detect")
                .missing_channel(TableKind::GaitCycle(side), HEEL_STRIKE_COLUMN));
        }

        let column = marker_column(side, &self.config.heel_landmark, self.config.marker_axes.vertical);
        let markers = trial.table(TableKind::Markers).ok_or_else(|| {
            GaitErrorBuilder::new("detector", "detect").missing_channel(TableKind::Markers, &column)
        })?;
        let heel_height = markers
            .column(&column)
            .ok_or_else(|| GaitErrorBuilder::new("detector", "detect").missing_channel(TableKind::Markers, &column))?;

        let heel_strikes = marker_fallback::detect_heel_strikes(markers.header(), heel_height, &self.config);
        if heel_strikes.is_empty() {
            warn!(trial = %trial.id(), %side, "marker fallback found no heel strikes");
        } else {
            debug!(trial = %trial.id(), %side, count = heel_strikes.len(), "heel strikes from heel-marker velocity");
        }

        let percent = marker_fallback::synthesize_gait_percent(markers.header(), &heel_strikes);
        Ok(GaitEventTrack {
            side,
            source: EventSource::MarkerVelocity,
            header: markers.header().to_vec(),
            percent,
            heel_strikes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falling_edges_basic() {
        let percent = [80.0, 90.0, 0.0, 10.0, 50.0, 99.0, 0.0, 5.0];
        assert_eq!(falling_edges(&percent, 0..percent.len()), vec![2, 6]);
    }

    #[test]
    fn test_falling_edges_respects_window() {
        let percent = [80.0, 90.0, 0.0, 10.0, 50.0, 99.0, 0.0, 5.0];
        assert_eq!(falling_edges(&percent, 3..8), vec![6]);
        assert!(falling_edges(&percent, 3..5).is_empty());
    }

    #[test]
    fn test_first_sample_is_never_an_edge() {
        let percent = [0.0, 10.0, 20.0];
        assert!(falling_edges(&percent, 0..3).is_empty());
    }

    #[test]
    fn test_boolean_channel_edges() {
        let flags = [1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(falling_edges(&flags, 0..flags.len()), vec![2, 5]);
    }

    #[test]
    fn test_track_window_queries() {
        let track = GaitEventTrack {
            side: Side::Right,
            source: EventSource::GaitCycleTable,
            header: vec![0.0, 0.5, 1.0, 1.5, 2.0],
            percent: vec![50.0, 0.0, 50.0, 0.0, 50.0],
            heel_strikes: vec![1, 3],
        };
        assert_eq!(track.first_strike_in(TimeWindow::new(0.0, 2.0)), Some(0.5));
        assert_eq!(track.first_strike_in(TimeWindow::new(0.6, 2.0)), Some(1.5));
        assert_eq!(track.strikes_in(TimeWindow::new(1.0, 2.0)), vec![3]);
        assert_eq!(track.events()[1].timestamp, 1.5);
    }
}
