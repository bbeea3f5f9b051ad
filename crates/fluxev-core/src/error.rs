// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxEV.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Error taxonomy for the charge-control loop

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("telemetry unavailable: {reading}: {reason}")]
    TelemetryUnavailable {
        reading: &'static str,
        reason: String,
    },

    #[error("invalid telemetry: {field} = {value}")]
    InvalidTelemetry { field: &'static str, value: f64 },

    #[error("override code {0} outside 0..=99")]
    InvalidOverride(i64),

    #[error("actuation failed: {0}")]
    ActuationFailure(String),

    #[error("metrics write failed for {series}.{field}: {reason}")]
    SinkWriteFailure {
        series: String,
        field: String,
        reason: String,
    },
}

impl ControlError {
    /// Errors that make the controller skip the decision step for the current cycle
    pub fn skips_cycle(&self) -> bool {
        matches!(
            self,
            Self::TelemetryUnavailable { .. } | Self::InvalidTelemetry { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_classification() {
        let unavailable = ControlError::TelemetryUnavailable {
            reading: "battery_soc",
            reason: "timeout".to_string(),
        };
        assert!(unavailable.skips_cycle());

        let invalid = ControlError::InvalidTelemetry {
            field: "battery_soc",
            value: 140.0,
        };
        assert!(invalid.skips_cycle());

        assert!(!ControlError::InvalidOverride(120).skips_cycle());
        assert!(!ControlError::ActuationFailure("relay".to_string()).skips_cycle());
    }

    #[test]
    fn test_error_messages() {
        let err = ControlError::TelemetryUnavailable {
            reading: "power_to_grid",
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "telemetry unavailable: power_to_grid: connection refused"
        );
        assert_eq!(
            ControlError::InvalidOverride(-3).to_string(),
            "override code -3 outside 0..=99"
        );
    }
}
