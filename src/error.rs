// src/error.rs
//! Unified error handling for the gait canonicalization pipeline
//!
//! Every failure in the pipeline is expressed as a [`GaitError`]. Each variant
//! carries an [`ErrorContext`] describing where it was raised, and reports a
//! [`Disposition`] telling the batch runner which unit to skip. No variant is
//! fatal to a whole batch.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

use crate::trial::{Side, TableKind};

/// Unified error type for the whole pipeline
#[derive(Debug, Clone, Error)]
pub enum GaitError {
    /// A signal column is absent; the pipeline fills it and continues
    #[error("[CHANNEL] Missing channel '{channel}' in {table} table ({})", .context.operation)]
    MissingChannel {
        table: TableKind,
        channel: String,
        context: ErrorContext,
    },

    /// A stride has too few samples or an incomplete cycle
    #[error("[STRIDE] Insufficient data for {side} stride [{start_time:.3}s, {end_time:.3}s]: {reason}")]
    InsufficientStrideData {
        side: Side,
        start_time: f64,
        end_time: f64,
        reason: String,
        context: ErrorContext,
    },

    /// A table required for this locomotion mode is absent
    #[error("[TRIAL] Mandatory {table} table missing for trial '{trial}' ({})", .context.operation)]
    MissingMandatoryTable {
        table: TableKind,
        trial: String,
        context: ErrorContext,
    },

    /// No heel strike inside the analysed window
    #[error("[EVENTS] No heel strike found in window [{window_start:.3}s, {window_end:.3}s] ({})", .context.operation)]
    NoHeelStrikeFound {
        window_start: f64,
        window_end: f64,
        context: ErrorContext,
    },

    /// No force plate qualifies for a side; GRF is left unresolved
    #[error("[FORCE] Ambiguous force assignment for {role} side: {reason}")]
    ForceAssignmentAmbiguous {
        role: String,
        reason: String,
        context: ErrorContext,
    },

    /// Configuration and setup errors
    #[error("[CONFIG] Configuration error in {component}: {reason} ({})", .context.operation)]
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Malformed input data
    #[error("[DATA] Invalid {data_type}: {reason}{}", format_expectation(.expected, .actual))]
    InvalidData {
        data_type: String,
        reason: String,
        expected: Option<String>,
        actual: Option<String>,
        context: ErrorContext,
    },

    /// The validator's tolerance gate failed
    #[error("[VALIDATION] Mean RMSE mismatch: fresh {fresh_rmse:.5} vs stored {stored_rmse:.5} exceeds tolerance {tolerance}")]
    ValidationFailed {
        fresh_rmse: f64,
        stored_rmse: f64,
        tolerance: f64,
        context: ErrorContext,
    },
}

fn format_expectation(expected: &Option<String>, actual: &Option<String>) -> String {
    match (expected, actual) {
        (Some(exp), Some(act)) => format!(" (expected: {}, got: {})", exp, act),
        _ => String::new(),
    }
}

/// Recovery action associated with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    /// Fill the missing signal per policy and keep going
    FillAndContinue,
    /// Drop the affected stride only
    SkipStride,
    /// Drop the affected trial, continue the batch
    AbortTrial,
    /// Drop the affected segment window
    SkipWindow,
    /// Emit the stride with unresolved (filled) force arrays
    EmitUnresolved,
    /// Hard gate with no retry
    Gate,
}

impl GaitError {
    /// Smallest unit affected by this error
    pub fn disposition(&self) -> Disposition {
        match self {
            GaitError::MissingChannel { .. } => Disposition::FillAndContinue,
            GaitError::InsufficientStrideData { .. } => Disposition::SkipStride,
            GaitError::MissingMandatoryTable { .. } => Disposition::AbortTrial,
            GaitError::NoHeelStrikeFound { .. } => Disposition::SkipWindow,
            GaitError::ForceAssignmentAmbiguous { .. } => Disposition::EmitUnresolved,
            GaitError::Configuration { .. } | GaitError::InvalidData { .. } => Disposition::AbortTrial,
            GaitError::ValidationFailed { .. } => Disposition::Gate,
        }
    }

    /// Context attached to the error
    pub fn context(&self) -> &ErrorContext {
        match self {
            GaitError::MissingChannel { context, .. }
            | GaitError::InsufficientStrideData { context, .. }
            | GaitError::MissingMandatoryTable { context, .. }
            | GaitError::NoHeelStrikeFound { context, .. }
            | GaitError::ForceAssignmentAmbiguous { context, .. }
            | GaitError::Configuration { context, .. }
            | GaitError::InvalidData { context, .. }
            | GaitError::ValidationFailed { context, .. } => context,
        }
    }
}

/// Error context for debugging and analysis
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: HashMap<String, String>,
    pub chain: Vec<String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: Self::current_thread_id(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: HashMap::new(),
            chain: Vec::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }

    /// Add to the error chain
    pub fn add_to_chain(mut self, error: &str) -> Self {
        self.chain.push(error.to_string());
        self
    }

    fn current_thread_id() -> Option<String> {
        std::thread::current().name().map(|s| s.to_string())
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component, self.operation)?;
        if let (Some(file), Some(line)) = (self.file, self.line) {
            write!(f, " at {}:{}", file, line)?;
        }
        Ok(())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

/// Result type alias for pipeline operations
pub type GaitResult<T> = Result<T, GaitError>;

/// Error builder for convenient error construction
pub struct GaitErrorBuilder {
    component: String,
    operation: String,
}

impl GaitErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(&self.component, &self.operation)
    }

    pub fn missing_channel(self, table: TableKind, channel: &str) -> GaitError {
        GaitError::MissingChannel {
            table,
            channel: channel.to_string(),
            context: self.context(),
        }
    }

    pub fn insufficient_stride(self, side: Side, start_time: f64, end_time: f64, reason: &str) -> GaitError {
        GaitError::InsufficientStrideData {
            side,
            start_time,
            end_time,
            reason: reason.to_string(),
            context: self.context().add_info("side", side.to_string()),
        }
    }

    pub fn missing_table(self, table: TableKind, trial: &str) -> GaitError {
        GaitError::MissingMandatoryTable {
            table,
            trial: trial.to_string(),
            context: self.context(),
        }
    }

    pub fn no_heel_strike(self, window_start: f64, window_end: f64) -> GaitError {
        GaitError::NoHeelStrikeFound {
            window_start,
            window_end,
            context: self.context(),
        }
    }

    pub fn force_ambiguous(self, role: &str, reason: &str) -> GaitError {
        GaitError::ForceAssignmentAmbiguous {
            role: role.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn configuration(self, reason: &str) -> GaitError {
        let context = self.context();
        GaitError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: &str) -> GaitError {
        GaitError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: None,
            actual: None,
            context: self.context(),
        }
    }

    pub fn invalid_data_with(self, data_type: &str, reason: &str, expected: String, actual: String) -> GaitError {
        GaitError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: Some(expected),
            actual: Some(actual),
            context: self.context(),
        }
    }

    pub fn validation_failed(self, fresh_rmse: f64, stored_rmse: f64, tolerance: f64) -> GaitError {
        GaitError::ValidationFailed {
            fresh_rmse,
            stored_rmse,
            tolerance,
            context: self.context(),
        }
    }
}
