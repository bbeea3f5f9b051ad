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

//! FluxEV core - diverts PV surplus into an EV charger
//!
//! Vendor-agnostic control logic. Meters, switches, metrics stores and command
//! transports plug in through the traits in [`traits`].

pub mod actuator;
pub mod controller;
pub mod debug;
pub mod error;
pub mod mode;
pub mod override_channel;
pub mod smoothing;
pub mod status;
pub mod telemetry;
pub mod traits;

pub use actuator::{SwitchActuator, SwitchCommand};
pub use controller::{ChargeController, ControllerSettings, CycleOutcome};
pub use debug::DebugModeConfig;
pub use error::{ControlError, Result};
pub use mode::{AutoProfile, BufferUpdate, ChargeMode, DecisionReason, ModeDecision};
pub use override_channel::{OverrideSender, OverrideSlot, run_override_listener};
pub use smoothing::SmoothingBuffer;
pub use status::{CycleReport, StatusBoard};
pub use telemetry::{TelemetrySnapshot, acquire_snapshot};
pub use traits::{CommandSource, MeterClient, MetricsSink, SwitchClient};
