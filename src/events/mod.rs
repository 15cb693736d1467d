// src/events/mod.rs
//! Gait event detection
//!
//! Heel strikes are taken from the falling edges of each leg's gait-percent
//! channel, or from heel-marker velocity when that channel is absent.

pub mod detector;
pub mod marker_fallback;

pub use detector::{falling_edges, EventSource, GaitEvent, GaitEventTrack, HeelStrikeDetector};
