// src/simulation/mod.rs
//! Synthetic trial generation for tests, benchmarks and demos

pub mod config;
pub mod gait_model;
pub mod trial_generator;

pub use config::{NoiseConfig, PlateConfig, SimulationConfig};
pub use trial_generator::TrialGenerator;
