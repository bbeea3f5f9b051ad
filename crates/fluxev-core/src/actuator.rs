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

use crate::debug::DebugModeConfig;
use crate::error::{ControlError, Result};
use crate::traits::SwitchClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchCommand {
    On,
    Off,
}

impl SwitchCommand {
    /// Hysteresis rule: on once the smoothed availability reaches the threshold
    pub fn decide(smoothed_mean: f64, threshold: f64) -> Self {
        if smoothed_mean >= threshold {
            Self::On
        } else {
            Self::Off
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for SwitchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Sends switch commands, honouring debug mode
pub struct SwitchActuator {
    switch: Arc<dyn SwitchClient>,
    debug: DebugModeConfig,
    timeout: Duration,
}

impl fmt::Debug for SwitchActuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchActuator")
            .field("switch", &self.switch.name())
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SwitchActuator {
    pub fn new(switch: Arc<dyn SwitchClient>, debug: DebugModeConfig, timeout: Duration) -> Self {
        Self {
            switch,
            debug,
            timeout,
        }
    }

    /// Command the switch. Sent every cycle, even when unchanged.
    pub async fn apply(&self, command: SwitchCommand, reason: &str) -> Result<()> {
        if !self.debug.should_execute() {
            self.debug
                .log_would_execute(&format!("switch {command}"), self.switch.name(), reason);
            return Ok(());
        }

        info!("🔌 Switch {} ({})", command, reason);
        let call = async {
            match command {
                SwitchCommand::On => self.switch.set_on().await,
                SwitchCommand::Off => self.switch.set_off().await,
            }
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ControlError::ActuationFailure(format!(
                "{} rejected '{command}': {e:#}",
                self.switch.name()
            ))),
            Err(_) => Err(ControlError::ActuationFailure(format!(
                "{} did not acknowledge '{command}' within {}s",
                self.switch.name(),
                self.timeout.as_secs_f32()
            ))),
        }
    }
}
