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
use fluxev_core::SwitchClient;
use serde_json::json;
use tracing::debug;

/// Entity ids belonging to the charger switch
#[derive(Debug, Clone)]
pub struct SwitchEntities {
    /// `switch.*` entity that controls the relay
    pub switch: String,
    pub power: String,
    pub energy: String,
    pub temperature: String,
}

/// Smart plug/relay exposed through Home Assistant
#[derive(Debug, Clone)]
pub struct HaSwitchClient {
    client: HomeAssistantClient,
    entities: SwitchEntities,
}

impl HaSwitchClient {
    pub fn new(client: HomeAssistantClient, entities: SwitchEntities) -> Self {
        Self { client, entities }
    }

    async fn turn(&self, service: &str) -> Result<()> {
        debug!("{} -> {}", service, self.entities.switch);
        self.client
            .call_service(service, json!({ "entity_id": self.entities.switch }))
            .await
            .with_context(|| format!("{service} failed for {}", self.entities.switch))
    }
}

#[async_trait]
impl SwitchClient for HaSwitchClient {
    async fn get_power(&self) -> Result<f64> {
        Ok(self.client.get_state(&self.entities.power).await?.power_w()?)
    }

    async fn get_energy(&self) -> Result<f64> {
        Ok(self
            .client
            .get_state(&self.entities.energy)
            .await?
            .energy_kwh()?)
    }

    async fn get_temperature(&self) -> Result<f64> {
        Ok(self
            .client
            .get_state(&self.entities.temperature)
            .await?
            .numeric_value()?)
    }

    async fn get_state(&self) -> Result<bool> {
        Ok(self.client.get_state(&self.entities.switch).await?.is_on()?)
    }

    async fn set_on(&self) -> Result<()> {
        self.turn("switch.turn_on").await
    }

    async fn set_off(&self) -> Result<()> {
        self.turn("switch.turn_off").await
    }

    fn name(&self) -> &str {
        &self.entities.switch
    }
}
