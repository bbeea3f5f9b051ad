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

use crate::error::{ControlError, Result};
use crate::traits::{MeterClient, SwitchClient};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// One sampling pass over meter and switch
///
/// Created fresh every cycle and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Grid power (positive = export, negative = import)
    pub power_to_grid: f64,

    /// House consumption including the switched load (W)
    pub power_consumption: f64,

    /// PV generation (W)
    pub power_generated: f64,

    /// Power currently drawn by the EV charger (W)
    pub power_to_load: f64,

    /// Energy delivered to the EV charger (kWh)
    pub energy_to_load: f64,

    /// Battery state of charge (0-100%)
    pub battery_soc: f64,
}

impl TelemetrySnapshot {
    /// Reject readings the controller must not decide on
    pub fn validate(self) -> Result<Self> {
        let fields = [
            ("power_to_grid", self.power_to_grid),
            ("power_consumption", self.power_consumption),
            ("power_generated", self.power_generated),
            ("power_to_load", self.power_to_load),
            ("energy_to_load", self.energy_to_load),
            ("battery_soc", self.battery_soc),
        ];
        if let Some((field, value)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ControlError::InvalidTelemetry { field, value });
        }

        if !(0.0..=100.0).contains(&self.battery_soc) {
            return Err(ControlError::InvalidTelemetry {
                field: "battery_soc",
                value: self.battery_soc,
            });
        }

        Ok(self)
    }

    /// House consumption without the EV charger
    pub fn house_load(&self) -> f64 {
        self.power_consumption - self.power_to_load
    }
}

/// Await a collaborator call with a bounded timeout
pub(crate) async fn bounded<T>(
    reading: &'static str,
    timeout: Duration,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ControlError::TelemetryUnavailable {
            reading,
            reason: format!("{e:#}"),
        }),
        Err(_) => Err(ControlError::TelemetryUnavailable {
            reading,
            reason: format!("no answer within {}s", timeout.as_secs_f32()),
        }),
    }
}

/// Read every value the decision needs, failing on the first missing one
pub async fn acquire_snapshot(
    meter: &dyn MeterClient,
    switch: &dyn SwitchClient,
    timeout: Duration,
) -> Result<TelemetrySnapshot> {
    let power_to_grid = bounded("power_to_grid", timeout, meter.read_power_to_grid()).await?;
    let power_consumption = bounded("power_consumption", timeout, meter.read_consumption()).await?;
    let power_generated = bounded("power_generated", timeout, meter.read_generated_power()).await?;
    let power_to_load = bounded("power_to_load", timeout, switch.get_power()).await?;
    let energy_to_load = bounded("energy_to_load", timeout, switch.get_energy()).await?;
    let battery_soc = bounded("battery_soc", timeout, meter.read_battery_soc()).await?;

    debug!(
        "pwr_gen: {power_generated}, pwr_grid: {power_to_grid}, pwr_consum: {power_consumption}, pwr_ev: {power_to_load}, soc: {battery_soc}"
    );

    TelemetrySnapshot {
        power_to_grid,
        power_consumption,
        power_generated,
        power_to_load,
        energy_to_load,
        battery_soc,
    }
    .validate()
}
