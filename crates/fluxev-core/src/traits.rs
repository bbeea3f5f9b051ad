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

use anyhow::Result;
use async_trait::async_trait;

// ============= Collaborator Traits =============
// Business logic uses these traits and never knows about HA/Influx/HTTP details.

/// Source of inverter and grid meter readings
#[async_trait]
pub trait MeterClient: Send + Sync {
    /// Grid power in watts (positive = export, negative = import)
    async fn read_power_to_grid(&self) -> Result<f64>;

    /// Total PV generation in watts
    async fn read_generated_power(&self) -> Result<f64>;

    /// House consumption in watts, including the switched load
    async fn read_consumption(&self) -> Result<f64>;

    /// Battery state of charge (0-100%)
    async fn read_battery_soc(&self) -> Result<f64>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Smart switch that powers the EV charger
///
/// `set_on`/`set_off` must tolerate redundant calls: the controller commands
/// the switch every cycle without tracking what it sent last time.
#[async_trait]
pub trait SwitchClient: Send + Sync {
    /// Power flowing through the switch (W)
    async fn get_power(&self) -> Result<f64>;

    /// Energy delivered through the switch (kWh)
    async fn get_energy(&self) -> Result<f64>;

    /// Switch device temperature (°C)
    async fn get_temperature(&self) -> Result<f64>;

    /// Whether the relay is currently closed
    async fn get_state(&self) -> Result<bool>;

    async fn set_on(&self) -> Result<()>;

    async fn set_off(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Best-effort time-series export
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn write(&self, series: &str, field: &str, value: f64) -> Result<()>;

    fn name(&self) -> &str;
}

/// Asynchronous source of raw mode-change codes
///
/// Codes are delivered unvalidated; range checking belongs to the override channel.
#[async_trait]
pub trait CommandSource: Send {
    /// Wait for the next code. `None` means the source is closed for good.
    async fn next_code(&mut self) -> Option<i64>;

    fn name(&self) -> &str;
}
