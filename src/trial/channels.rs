// src/trial/channels.rs
//! Named channel tables keyed by a `Header` timestamp column

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GaitErrorBuilder, GaitResult};

/// A table of equally long value columns sharing one timestamp header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTable {
    header: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}

/// Borrowed view of one column with its timestamps
#[derive(Debug, Clone, Copy)]
pub struct ChannelView<'a> {
    pub timestamps: &'a [f64],
    pub values: &'a [f64],
}

impl ChannelTable {
    /// Create an empty table over the given timestamps
    ///
    /// Timestamps must be finite and strictly increasing.
    pub fn new(header: Vec<f64>) -> GaitResult<Self> {
        if header.iter().any(|t| !t.is_finite()) {
            return Err(GaitErrorBuilder::new("channel_table", "new")
                .invalid_data("Header", "timestamps must be finite"));
        }
        if let Some(index) = header.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GaitErrorBuilder::new("channel_table", "new").invalid_data(
                "Header",
                &format!("timestamps must be strictly increasing (index {})", index + 1),
            ));
        }

        Ok(Self {
            header,
            columns: BTreeMap::new(),
        })
    }

    /// Builder-style column insertion
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> GaitResult<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Insert or replace a column; its length must match the header
    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> GaitResult<()> {
        if values.len() != self.header.len() {
            return Err(GaitErrorBuilder::new("channel_table", "insert_column").invalid_data_with(
                &format!("column '{}'", name),
                "length does not match Header",
                self.header.len().to_string(),
                values.len().to_string(),
            ));
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        self.columns.remove(name)
    }

    pub fn header(&self) -> &[f64] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn channel(&self, name: &str) -> Option<ChannelView<'_>> {
        self.column(name).map(|values| ChannelView {
            timestamps: &self.header,
            values,
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Time span covered by the header
    pub fn time_span(&self) -> Option<(f64, f64)> {
        match (self.header.first(), self.header.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }

    /// Number of header samples with `start <= t <= end`
    pub fn samples_within(&self, start: f64, end: f64) -> usize {
        let lo = self.header.partition_point(|&t| t < start);
        let hi = self.header.partition_point(|&t| t <= end);
        hi.saturating_sub(lo)
    }

    /// Index of the first sample at or after `t`
    pub fn index_at_or_after(&self, t: f64) -> usize {
        self.header.partition_point(|&h| h < t)
    }
}

/// Per-sample activity labels (e.g. `idle`, `stairascent`) over their own header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTrack {
    pub header: Vec<f64>,
    pub labels: Vec<String>,
}

impl LabelTrack {
    pub fn new(header: Vec<f64>, labels: Vec<String>) -> GaitResult<Self> {
        if header.len() != labels.len() {
            return Err(GaitErrorBuilder::new("label_track", "new").invalid_data_with(
                "label track",
                "label count does not match Header",
                header.len().to_string(),
                labels.len().to_string(),
            ));
        }
        Ok(Self { header, labels })
    }

    /// Contiguous runs of identical labels as `(label, start_time, end_time)`
    pub fn runs(&self) -> Vec<(String, f64, f64)> {
        let mut runs: Vec<(String, f64, f64)> = Vec::new();
        for (t, label) in self.header.iter().zip(&self.labels) {
            match runs.last_mut() {
                Some(run) if run.0 == *label => run.2 = *t,
                _ => runs.push((label.clone(), *t, *t)),
            }
        }
        runs
    }
}
