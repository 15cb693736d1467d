// src/trial/mod.rs
//! Raw trial data model
//!
//! A [`RawTrial`] is the loader's view of one motion-capture trial: a set of
//! named [`ChannelTable`]s (kinematics, kinetics, gait-cycle percent, force
//! plates, markers, reference inverse dynamics) plus trial metadata. The
//! pipeline only reads from it.

pub mod channels;
pub mod naming;
pub mod schema;
pub mod task;

pub use channels::{ChannelTable, ChannelView, LabelTrack};
pub use naming::Axis;
pub use schema::TrialSchema;
pub use task::TaskDescriptor;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Right,
    Left,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Right, Side::Left];

    pub fn opposite(self) -> Side {
        match self {
            Side::Right => Side::Left,
            Side::Left => Side::Right,
        }
    }

    /// Lowercase suffix used in kinematic/kinetic column names (`_r`, `_l`)
    pub fn suffix(self) -> &'static str {
        match self {
            Side::Right => "r",
            Side::Left => "l",
        }
    }

    /// Uppercase prefix used in marker column names (`R_`, `L_`)
    pub fn marker_prefix(self) -> &'static str {
        match self {
            Side::Right => "R",
            Side::Left => "L",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Right => write!(f, "right"),
            Side::Left => write!(f, "left"),
        }
    }
}

/// Role of a leg within a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ipsi,
    Contra,
}

impl Role {
    pub const BOTH: [Role; 2] = [Role::Ipsi, Role::Contra];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Ipsi => "ipsi",
            Role::Contra => "contra",
        }
    }

    /// Physical side playing this role when `ipsi` is the ipsilateral leg
    pub fn side(self, ipsi: Side) -> Side {
        match self {
            Role::Ipsi => ipsi,
            Role::Contra => ipsi.opposite(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value held once per body side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMap<T> {
    pub right: T,
    pub left: T,
}

impl<T> SideMap<T> {
    pub fn new(right: T, left: T) -> Self {
        Self { right, left }
    }

    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            right: f(Side::Right),
            left: f(Side::Left),
        }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Right => &self.right,
            Side::Left => &self.left,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Right => &mut self.right,
            Side::Left => &mut self.left,
        }
    }
}

/// Kinds of channel tables a trial may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Kinematics,
    Kinetics,
    GaitCycle(Side),
    ForcePlates,
    Markers,
    InverseDynamics,
    Conditions,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Kinematics => write!(f, "kinematics"),
            TableKind::Kinetics => write!(f, "kinetics"),
            TableKind::GaitCycle(side) => write!(f, "gait-cycle ({})", side),
            TableKind::ForcePlates => write!(f, "force-plate"),
            TableKind::Markers => write!(f, "markers"),
            TableKind::InverseDynamics => write!(f, "inverse-dynamics"),
            TableKind::Conditions => write!(f, "conditions"),
        }
    }
}

/// Locomotion mode of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocomotionMode {
    Treadmill,
    LevelGround,
    Ramp,
    Stair,
}

impl fmt::Display for LocomotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocomotionMode::Treadmill => write!(f, "treadmill"),
            LocomotionMode::LevelGround => write!(f, "levelground"),
            LocomotionMode::Ramp => write!(f, "ramp"),
            LocomotionMode::Stair => write!(f, "stair"),
        }
    }
}

/// Trial metadata supplied by the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialInfo {
    pub subject: String,
    pub trial: String,
    pub mode: LocomotionMode,
    pub mass_kg: f64,
    /// Nominal walking or belt speed
    pub speed_m_s: Option<f64>,
    /// Signed ramp inclination (positive = uphill)
    pub incline_deg: Option<f64>,
    pub stair_height_mm: Option<f64>,
}

/// Inclusive time interval in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Index range of `header` samples that fall inside the window
    pub fn index_range(&self, header: &[f64]) -> std::ops::Range<usize> {
        let lo = header.partition_point(|&t| t < self.start);
        let hi = header.partition_point(|&t| t <= self.end);
        lo..hi.max(lo)
    }
}

/// One motion-capture trial as delivered by the loader
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrial {
    pub info: TrialInfo,
    tables: HashMap<TableKind, ChannelTable>,
    pub labels: Option<LabelTrack>,
}

impl RawTrial {
    pub fn new(info: TrialInfo) -> Self {
        Self {
            info,
            tables: HashMap::new(),
            labels: None,
        }
    }

    pub fn with_table(mut self, kind: TableKind, table: ChannelTable) -> Self {
        self.tables.insert(kind, table);
        self
    }

    pub fn with_labels(mut self, labels: LabelTrack) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn insert_table(&mut self, kind: TableKind, table: ChannelTable) {
        self.tables.insert(kind, table);
    }

    pub fn remove_table(&mut self, kind: TableKind) -> Option<ChannelTable> {
        self.tables.remove(&kind)
    }

    pub fn table(&self, kind: TableKind) -> Option<&ChannelTable> {
        self.tables.get(&kind)
    }

    pub fn table_mut(&mut self, kind: TableKind) -> Option<&mut ChannelTable> {
        self.tables.get_mut(&kind)
    }

    pub fn has_table(&self, kind: TableKind) -> bool {
        self.tables.contains_key(&kind)
    }

    /// `subject/trial` identifier used in logs and failures
    pub fn id(&self) -> String {
        format!("{}/{}", self.info.subject, self.info.trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_side_mapping() {
        assert_eq!(Role::Ipsi.side(Side::Left), Side::Left);
        assert_eq!(Role::Contra.side(Side::Left), Side::Right);
    }

    #[test]
    fn test_window_index_range() {
        let header = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(TimeWindow::new(0.5, 1.5).index_range(&header), 1..4);
        assert_eq!(TimeWindow::new(3.0, 4.0).index_range(&header), 5..5);
        assert_eq!(TimeWindow::unbounded().index_range(&header), 0..5);
    }

    #[test]
    fn test_side_map_access() {
        let mut map = SideMap::from_fn(|s| s.suffix().to_string());
        assert_eq!(map.get(Side::Left), "l");
        *map.get_mut(Side::Right) = "x".to_string();
        assert_eq!(map.right, "x");
    }
}
