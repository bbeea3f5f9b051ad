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

//! Operating modes of the charge controller
//!
//! Each mode owns its eligibility rule, its availability formula and its
//! switching threshold. Evaluation is pure: a mode looks at one snapshot and
//! tells the controller which sample to feed into the smoothing window, how to
//! feed it, and which threshold the smoothed mean must reach.

use crate::smoothing::SmoothingBuffer;
use crate::telemetry::TelemetrySnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid draw tolerated before the house counts as importing (W)
const IMPORT_TOLERANCE_W: f64 = -100.0;

/// Sample written by ForceOn; any value above its threshold works
const FORCE_ON_SAMPLE_W: f64 = 2500.0;
const FORCE_ON_THRESHOLD_W: f64 = 1.0;
const FORCE_OFF_THRESHOLD_W: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChargeMode {
    /// Charge from pure excess while the battery still has headroom
    #[default]
    #[serde(rename = "max-auto")]
    MaxAutoCharge,
    /// Release charging only once the battery is nearly full and generation is large
    #[serde(rename = "min-auto")]
    MinAutoCharge,
    ForceOn,
    ForceOff,
}

impl ChargeMode {
    /// Map an override code to a mode. Unknown codes fall back to MaxAutoCharge.
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => Self::MinAutoCharge,
            21 => Self::ForceOn,
            22 => Self::ForceOff,
            // 1 and every unassigned code
            _ => Self::MaxAutoCharge,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MaxAutoCharge => "max-auto",
            Self::MinAutoCharge => "min-auto",
            Self::ForceOn => "force-on",
            Self::ForceOff => "force-off",
        }
    }

    /// Debug code offset for the automatic modes
    fn code_base(self) -> u8 {
        match self {
            Self::MinAutoCharge => 10,
            Self::MaxAutoCharge | Self::ForceOn | Self::ForceOff => 0,
        }
    }

    /// Evaluate one snapshot
    pub fn evaluate(self, snapshot: &TelemetrySnapshot) -> ModeDecision {
        match self {
            Self::MaxAutoCharge => AutoProfile::MAX.evaluate(self, snapshot),
            Self::MinAutoCharge => AutoProfile::MIN.evaluate(self, snapshot),
            Self::ForceOn => ModeDecision {
                mode: self,
                sample: FORCE_ON_SAMPLE_W,
                reason: DecisionReason::Forced,
                threshold: FORCE_ON_THRESHOLD_W,
                update: BufferUpdate::Replace,
            },
            Self::ForceOff => ModeDecision {
                mode: self,
                sample: 0.0,
                reason: DecisionReason::Forced,
                threshold: FORCE_OFF_THRESHOLD_W,
                update: BufferUpdate::Replace,
            },
        }
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Eligibility limits and threshold of an automatic mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoProfile {
    /// Minimum battery SOC (%) before surplus is released
    pub battery_floor: f64,
    /// Generation must exceed this (W)
    pub generation_floor: f64,
    /// Smoothed availability needed to switch on (W)
    pub switch_threshold: f64,
}

impl AutoProfile {
    pub const MAX: Self = Self {
        battery_floor: 50.0,
        generation_floor: 2500.0,
        switch_threshold: 6500.0,
    };

    pub const MIN: Self = Self {
        battery_floor: 95.0,
        generation_floor: 6500.0,
        switch_threshold: 2200.0,
    };

    fn evaluate(&self, mode: ChargeMode, snapshot: &TelemetrySnapshot) -> ModeDecision {
        let (sample, reason) = if snapshot.battery_soc < self.battery_floor {
            (0.0, DecisionReason::BatteryFloor)
        } else if snapshot.power_to_grid < IMPORT_TOLERANCE_W {
            (0.0, DecisionReason::Importing)
        } else if snapshot.power_generated <= self.generation_floor {
            (0.0, DecisionReason::GenerationBelowFloor)
        } else if snapshot.power_generated > snapshot.house_load() {
            (
                snapshot.power_generated - snapshot.house_load(),
                DecisionReason::SurplusPositive,
            )
        } else {
            (0.0, DecisionReason::SurplusAbsorbed)
        };

        ModeDecision {
            mode,
            sample,
            reason,
            threshold: self.switch_threshold,
            update: BufferUpdate::Append,
        }
    }
}

/// Which branch produced the availability sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    BatteryFloor,
    Importing,
    GenerationBelowFloor,
    SurplusPositive,
    SurplusAbsorbed,
    Forced,
}

impl DecisionReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::BatteryFloor => "house battery below floor",
            Self::Importing => "drawing significant power from grid",
            Self::GenerationBelowFloor => "PV generation below floor",
            Self::SurplusPositive => "PV surplus available",
            Self::SurplusAbsorbed => "house consumes the PV generation",
            Self::Forced => "forced by override",
        }
    }
}

/// How a decision's sample enters the smoothing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferUpdate {
    Append,
    /// Flush history so forced modes take effect within one cycle
    Replace,
}

/// Outcome of evaluating one snapshot in one mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeDecision {
    pub mode: ChargeMode,
    /// Instantaneous power available for the charger (W)
    pub sample: f64,
    pub reason: DecisionReason,
    /// Smoothed availability needed to switch on (W)
    pub threshold: f64,
    pub update: BufferUpdate,
}

impl ModeDecision {
    /// Numeric status code published alongside the metrics
    pub fn debug_code(&self) -> u8 {
        match (self.mode, self.reason) {
            (ChargeMode::ForceOn, _) => 21,
            (ChargeMode::ForceOff, _) => 22,
            (mode, reason) => {
                let offset = match reason {
                    DecisionReason::BatteryFloor => 2,
                    DecisionReason::Importing => 3,
                    DecisionReason::SurplusPositive => 5,
                    DecisionReason::SurplusAbsorbed => 6,
                    DecisionReason::GenerationBelowFloor | DecisionReason::Forced => 7,
                };
                mode.code_base() + offset
            }
        }
    }

    /// Feed the sample into the window the way this mode requires
    pub fn apply_to(&self, buffer: &mut SmoothingBuffer) {
        match self.update {
            BufferUpdate::Append => buffer.push(self.sample),
            BufferUpdate::Replace => buffer.replace(self.sample),
        }
    }
}
