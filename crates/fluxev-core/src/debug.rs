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

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Debug mode configuration
///
/// When debug mode is enabled (default: ON), the controller will:
/// - Run the full decision loop and publish metrics
/// - Log the switch command instead of sending it
///
/// This allows safe testing next to a real charger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugModeConfig {
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl Default for DebugModeConfig {
    fn default() -> Self {
        Self {
            enabled: true, // Safe default - debug mode ON
        }
    }
}

impl DebugModeConfig {
    /// Create with debug mode enabled
    pub fn enabled() -> Self {
        Self::default()
    }

    /// Create with debug mode disabled (production mode)
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Check if an action should be executed or just logged
    pub fn should_execute(&self) -> bool {
        !self.enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log that an action would be executed in production
    pub fn log_would_execute(&self, action: &str, target: &str, reason: &str) {
        if self.enabled {
            info!(
                "🔍 DEBUG MODE: Would execute '{}' on '{}' (reason: {})",
                action, target, reason
            );
        }
    }

    /// Warn when debug mode is disabled (production mode)
    pub fn warn_production_mode() {
        warn!("⚠️  DEBUG MODE DISABLED - System will switch the EV charger for real!");
        warn!("⚠️  Ensure configuration is correct before proceeding.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_safe() {
        let config = DebugModeConfig::default();
        assert!(config.is_enabled());
        assert!(!config.should_execute());
    }

    #[test]
    fn test_disabled_executes() {
        let config = DebugModeConfig::disabled();
        assert!(!config.is_enabled());
        assert!(config.should_execute());
    }
}
