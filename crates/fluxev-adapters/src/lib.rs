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

//! Concrete collaborators for the FluxEV control loop

pub mod command_api;
pub mod ha;
pub mod metrics;
pub mod mqtt;

pub use command_api::{CommandApiState, HttpCommandSource, command_channel, command_routes, serve};
pub use ha::{HaMeterClient, HaSwitchClient, HomeAssistantClient, MeterEntities, SwitchEntities};
pub use metrics::{InfluxSettings, InfluxSink, LogSink};
pub use mqtt::{MqttCommandSource, MqttSettings};
