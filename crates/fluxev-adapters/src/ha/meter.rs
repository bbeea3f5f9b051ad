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

use super::client::HomeAssistantClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fluxev_core::MeterClient;
use tracing::trace;

/// Entity ids the meter reads from
#[derive(Debug, Clone)]
pub struct MeterEntities {
    pub grid_power: String,
    pub pv_power: String,
    pub consumption: String,
    pub battery_soc: String,
    /// Most inverter integrations report import as positive; the controller
    /// expects export positive.
    pub grid_power_positive_is_import: bool,
}

/// Inverter/grid meter backed by Home Assistant sensor entities
#[derive(Debug, Clone)]
pub struct HaMeterClient {
    client: HomeAssistantClient,
    entities: MeterEntities,
}

impl HaMeterClient {
    pub fn new(client: HomeAssistantClient, entities: MeterEntities) -> Self {
        Self { client, entities }
    }

    async fn read_power(&self, entity_id: &str) -> Result<f64> {
        let state = self
            .client
            .get_state(entity_id)
            .await
            .with_context(|| format!("Failed to read {entity_id}"))?;
        let watts = state
            .power_w()
            .with_context(|| format!("Failed to parse {entity_id}"))?;
        trace!("{} = {} W", entity_id, watts);
        Ok(watts)
    }
}

#[async_trait]
impl MeterClient for HaMeterClient {
    async fn read_power_to_grid(&self) -> Result<f64> {
        let raw = self.read_power(&self.entities.grid_power).await?;
        Ok(if self.entities.grid_power_positive_is_import {
            -raw
        } else {
            raw
        })
    }

    async fn read_generated_power(&self) -> Result<f64> {
        self.read_power(&self.entities.pv_power).await
    }

    async fn read_consumption(&self) -> Result<f64> {
        // Some inverters report load as a negative flow
        Ok(self.read_power(&self.entities.consumption).await?.abs())
    }

    async fn read_battery_soc(&self) -> Result<f64> {
        let entity_id = &self.entities.battery_soc;
        let state = self
            .client
            .get_state(entity_id)
            .await
            .with_context(|| format!("Failed to read {entity_id}"))?;
        Ok(state.numeric_value()?)
    }

    fn name(&self) -> &str {
        "Home Assistant meter"
    }
}
