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

use crate::actuator::SwitchCommand;
use crate::mode::{ChargeMode, DecisionReason};
use crate::telemetry::TelemetrySnapshot;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Record of one completed control cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub mode: ChargeMode,
    pub reason: DecisionReason,
    pub debug_code: u8,
    /// This cycle's availability sample (W)
    pub sample_w: f64,
    /// Smoothed availability compared against the threshold (W)
    pub power_available_w: f64,
    pub threshold_w: f64,
    pub command: SwitchCommand,
    /// False when the switch rejected or ignored the command
    pub actuated: bool,
    pub snapshot: TelemetrySnapshot,
}

/// Latest cycle report, shared with the status API
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    latest: Arc<RwLock<Option<CycleReport>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, report: CycleReport) {
        *self.latest.write() = Some(report);
    }

    pub fn latest(&self) -> Option<CycleReport> {
        self.latest.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(code: u8) -> CycleReport {
        CycleReport {
            timestamp: Utc::now(),
            mode: ChargeMode::MaxAutoCharge,
            reason: DecisionReason::SurplusPositive,
            debug_code: code,
            sample_w: 1000.0,
            power_available_w: 200.0,
            threshold_w: 6500.0,
            command: SwitchCommand::Off,
            actuated: true,
            snapshot: TelemetrySnapshot {
                power_to_grid: 0.0,
                power_consumption: 2000.0,
                power_generated: 3000.0,
                power_to_load: 0.0,
                energy_to_load: 0.0,
                battery_soc: 60.0,
            },
        }
    }

    #[test]
    fn test_board_keeps_latest() {
        let board = StatusBoard::new();
        assert!(board.latest().is_none());

        board.update(report(5));
        board.clone().update(report(6));

        assert_eq!(board.latest().unwrap().debug_code, 6);
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_value(report(5)).unwrap();
        assert_eq!(json["mode"], "max-auto");
        assert_eq!(json["reason"], "surplus-positive");
        assert_eq!(json["command"], "off");
        assert_eq!(json["snapshot"]["battery_soc"], 60.0);
    }
}
