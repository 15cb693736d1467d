// src/segmentation/mod.rs
//! Trial segmentation and stride enumeration
//!
//! A trial is first split into [`TrialSegment`]s (contiguous activity runs,
//! or the whole trial). Within each segment the ipsilateral leg is chosen
//! and its consecutive heel strikes are turned into [`Stride`]s.

pub mod segmenter;

pub use segmenter::{choose_leg, SegmentStrides, SpeedReference, Stride, StrideSegmenter};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{SegmentationConfig, SegmentationMode};
use crate::trial::{RawTrial, TableKind, TimeWindow};

/// A contiguous portion of a trial processed as one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSegment {
    pub index: usize,
    /// Activity label of the run, when segmented by labels
    pub label: Option<String>,
    pub window: TimeWindow,
}

/// Split a trial into processing segments
///
/// Label-based segmentation keeps contiguous runs of non-idle labels. A
/// trial without a label track is treated as one segment.
pub fn trial_segments(trial: &RawTrial, config: &SegmentationConfig) -> Vec<TrialSegment> {
    let whole = || {
        let window = trial
            .table(TableKind::Kinematics)
            .and_then(|t| t.time_span())
            .map(|(start, end)| TimeWindow::new(start, end))
            .unwrap_or_else(TimeWindow::unbounded);
        vec![TrialSegment {
            index: 0,
            label: None,
            window,
        }]
    };

    match (config.mode, trial.labels.as_ref()) {
        (SegmentationMode::WholeTrial, _) => whole(),
        (SegmentationMode::LabelBased, None) => {
            warn!(trial = %trial.id(), "no label track, using whole trial");
            whole()
        }
        (SegmentationMode::LabelBased, Some(labels)) => {
            let is_idle = |label: &str| {
                label.trim().is_empty() || config.idle_labels.iter().any(|idle| idle.eq_ignore_ascii_case(label.trim()))
            };
            let segments: Vec<TrialSegment> = labels
                .runs()
                .into_iter()
                .filter(|(label, _, _)| !is_idle(label))
                .enumerate()
                .map(|(index, (label, start, end))| TrialSegment {
                    index,
                    label: Some(label),
                    window: TimeWindow::new(start, end),
                })
                .collect();
            debug!(trial = %trial.id(), segments = segments.len(), "label-based segmentation");
            segments
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{ChannelTable, LabelTrack, LocomotionMode, TrialInfo};

    fn trial() -> RawTrial {
        let info = TrialInfo {
            subject: "AB01".into(),
            trial: "stair_1".into(),
            mode: LocomotionMode::Stair,
            mass_kg: 70.0,
            speed_m_s: None,
            incline_deg: None,
            stair_height_mm: Some(102.0),
        };
        let header: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        RawTrial::new(info).with_table(TableKind::Kinematics, ChannelTable::new(header).unwrap())
    }

    fn labels(values: &[&str]) -> LabelTrack {
        let header = (0..values.len()).map(|i| i as f64 * 0.5).collect();
        LabelTrack::new(header, values.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_whole_trial_spans_kinematics() {
        let config = SegmentationConfig {
            mode: SegmentationMode::WholeTrial,
            ..Default::default()
        };
        let segments = trial_segments(&trial(), &config);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].window, TimeWindow::new(0.0, 4.5));
    }

    #[test]
    fn test_label_runs_skip_idle() {
        let t = trial().with_labels(labels(&[
            "idle", "stairascent", "stairascent", "Idle", "stand", "stairdescent", "stairdescent", "idle",
        ]));
        let segments = trial_segments(&t, &SegmentationConfig::default());
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].label.as_deref(), Some("stairascent"));
        assert_eq!(segments[0].window, TimeWindow::new(0.5, 1.0));
        assert_eq!(segments[1].index, 1);
        assert_eq!(segments[1].label.as_deref(), Some("stairdescent"));
    }

    #[test]
    fn test_missing_labels_fall_back_to_whole_trial() {
        let segments = trial_segments(&trial(), &SegmentationConfig::default());
        assert_eq!(segments.len(), 1);
        assert!(segments[0].label.is_none());
    }
}
