// src/force_plate/mod.rs
//! Force-plate assignment and GRF/COP canonicalization
//!
//! Plates are identified by the prefix of their `<PlateId>_{vx,vy,vz,px,py,pz}`
//! columns. The component carrying vertical, anterior and lateral force is
//! chosen by an [`AxisMap`] rather than inferred from channel labels.

pub mod assignment;
pub mod cop;
pub mod swap;

pub use assignment::{AssignmentOutcome, PlateAssigner, PlateAssignment};
pub use cop::{CenterOfPressure, GroundReaction, LegLoad, LoadCanonicalizer};
pub use swap::{check_swap, SwapCheck};

use crate::config::AxisMap;
use crate::trial::naming::{plate_cop_column, plate_force_column};
use crate::trial::{ChannelTable, ChannelView};

/// Borrowed view of one plate's channels
#[derive(Debug, Clone, Copy)]
pub struct PlateView<'a> {
    pub id: &'a str,
    table: &'a ChannelTable,
    axes: AxisMap,
}

impl<'a> PlateView<'a> {
    /// `None` when the plate has no vertical force column
    pub fn new(table: &'a ChannelTable, id: &'a str, axes: AxisMap) -> Option<Self> {
        table
            .has_column(&plate_force_column(id, axes.vertical))
            .then_some(Self { id, table, axes })
    }

    pub fn vertical_force(&self) -> Option<ChannelView<'a>> {
        self.table.channel(&plate_force_column(self.id, self.axes.vertical))
    }

    pub fn anterior_force(&self) -> Option<ChannelView<'a>> {
        self.table.channel(&plate_force_column(self.id, self.axes.anterior))
    }

    pub fn lateral_force(&self) -> Option<ChannelView<'a>> {
        self.table.channel(&plate_force_column(self.id, self.axes.lateral))
    }

    pub fn cop_anterior(&self) -> Option<ChannelView<'a>> {
        self.table.channel(&plate_cop_column(self.id, self.axes.anterior))
    }

    pub fn cop_vertical(&self) -> Option<ChannelView<'a>> {
        self.table.channel(&plate_cop_column(self.id, self.axes.vertical))
    }

    pub fn cop_lateral(&self) -> Option<ChannelView<'a>> {
        self.table.channel(&plate_cop_column(self.id, self.axes.lateral))
    }
}
