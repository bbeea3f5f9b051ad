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

use anyhow::{Context, Result};
use fluxev_adapters::{InfluxSettings, MeterEntities, MqttSettings, SwitchEntities};
use fluxev_core::{ControllerSettings, DebugModeConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

const ADDON_OPTIONS_PATH: &str = "/data/options.json";

/// Largest accepted smoothing window; the buffer is allocated up front
pub const MAX_SMOOTHING_WINDOW: usize = 1000;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub meter: MeterConfig,
    #[serde(default)]
    pub switch: SwitchConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

/// Control loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Seconds between cycle starts
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,

    /// Samples averaged before the switch decision
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,

    /// Upper bound for any single HA/InfluxDB call (seconds)
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

fn default_cycle_interval_secs() -> u64 {
    120
}

fn default_smoothing_window() -> usize {
    5
}

fn default_io_timeout_secs() -> u64 {
    10
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            smoothing_window: default_smoothing_window(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

/// Inverter/grid meter entities in Home Assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    pub grid_power_entity: String,
    pub pv_power_entity: String,
    pub consumption_entity: String,
    pub battery_soc_entity: String,

    /// Set to false if the grid sensor already reports export as positive
    #[serde(default = "default_true")]
    pub grid_power_positive_is_import: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            grid_power_entity: "sensor.grid_power".to_string(),
            pv_power_entity: "sensor.pv_power".to_string(),
            consumption_entity: "sensor.house_load".to_string(),
            battery_soc_entity: "sensor.battery_soc".to_string(),
            grid_power_positive_is_import: true,
        }
    }
}

/// Charger switch entities in Home Assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub switch_entity: String,
    pub power_entity: String,
    pub energy_entity: String,
    pub temperature_entity: String,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            switch_entity: "switch.ev_charger".to_string(),
            power_entity: "sensor.ev_charger_power".to_string(),
            energy_entity: "sensor.ev_charger_energy".to_string(),
            temperature_entity: "sensor.ev_charger_temperature".to_string(),
        }
    }
}

/// InfluxDB export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_influx_url")]
    pub url: String,

    #[serde(default = "default_influx_database")]
    pub database: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Measurement name every metric is written under
    #[serde(default = "default_series")]
    pub series: String,
}

fn default_influx_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_influx_database() -> String {
    "solar".to_string()
}

fn default_series() -> String {
    "ev_charger".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_influx_url(),
            database: default_influx_database(),
            username: None,
            password: None,
            series: default_series(),
        }
    }
}

/// Mode-change inputs: the HTTP command API and an optional MQTT subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_8098")]
    pub port: u16,

    #[serde(default)]
    pub mqtt: MqttConfig,
}

fn default_8098() -> u16 {
    8098
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_8098(),
            mqtt: MqttConfig::default(),
        }
    }
}

/// MQTT topic carrying integer mode-change codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_1883")]
    pub port: u16,

    #[serde(default = "default_mqtt_topic")]
    pub topic: String,

    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_mqtt_host() -> String {
    "core-mosquitto".to_string()
}

fn default_1883() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "fluxev/change_state".to_string()
}

fn default_mqtt_client_id() -> String {
    "fluxev".to_string()
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_mqtt_host(),
            port: default_1883(),
            topic: default_mqtt_topic(),
            client_id: default_mqtt_client_id(),
            username: None,
            password: None,
        }
    }
}

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Debug mode (default: true for safety)
    #[serde(default = "default_true")]
    pub debug_mode: bool,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Home Assistant base URL (optional, defaults to supervisor)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ha_base_url: Option<String>,

    /// Home Assistant token (optional, uses SUPERVISOR_TOKEN if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ha_token: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            debug_mode: true,
            log_level: default_log_level(),
            ha_base_url: None,
            ha_token: None,
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    AddonOptions,
    Toml,
    Json,
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddonOptions => "HA addon options",
            Self::Toml => "config.toml",
            Self::Json => "config.json",
            Self::Defaults => "defaults with environment overrides",
        })
    }
}

impl AppConfig {
    /// Load configuration from HA addon options or a config file in the working directory
    pub fn load() -> Result<(Self, ConfigSource)> {
        Self::load_from(Path::new(ADDON_OPTIONS_PATH), Path::new("."))
    }

    /// Same lookup order as [`AppConfig::load`] with explicit locations
    pub fn load_from(addon_options: &Path, dev_dir: &Path) -> Result<(Self, ConfigSource)> {
        let (config, source) = if let Ok(options_str) = std::fs::read_to_string(addon_options) {
            let config: AppConfig =
                serde_json::from_str(&options_str).context("Failed to parse HA addon options")?;
            (config, ConfigSource::AddonOptions)
        } else if let Ok(config_str) = std::fs::read_to_string(dev_dir.join("config.toml")) {
            let config: AppConfig =
                toml::from_str(&config_str).context("Failed to parse config.toml")?;
            (config, ConfigSource::Toml)
        } else if let Ok(config_str) = std::fs::read_to_string(dev_dir.join("config.json")) {
            let config: AppConfig =
                serde_json::from_str(&config_str).context("Failed to parse config.json")?;
            (config, ConfigSource::Json)
        } else {
            (Self::from_env(), ConfigSource::Defaults)
        };

        config.validate()?;
        Ok((config, source))
    }

    /// Defaults with environment overrides (development/testing)
    fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(debug_mode) = lookup("DEBUG_MODE")
            && let Ok(enabled) = debug_mode.parse::<bool>()
        {
            self.system.debug_mode = enabled;
        }

        if let Some(interval) = lookup("CYCLE_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            self.controller.cycle_interval_secs = secs;
        }

        if let Some(url) = lookup("HA_BASE_URL") {
            self.system.ha_base_url = Some(url);
        }
        if let Some(token) = lookup("HA_TOKEN") {
            self.system.ha_token = Some(token);
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        let entities = [
            ("meter.grid_power_entity", &self.meter.grid_power_entity),
            ("meter.pv_power_entity", &self.meter.pv_power_entity),
            ("meter.consumption_entity", &self.meter.consumption_entity),
            ("meter.battery_soc_entity", &self.meter.battery_soc_entity),
            ("switch.switch_entity", &self.switch.switch_entity),
            ("switch.power_entity", &self.switch.power_entity),
            ("switch.energy_entity", &self.switch.energy_entity),
            ("switch.temperature_entity", &self.switch.temperature_entity),
        ];
        for (name, entity) in entities {
            if entity.trim().is_empty() {
                anyhow::bail!("{name} cannot be empty");
            }
        }

        let controller = &self.controller;
        if controller.smoothing_window == 0 {
            anyhow::bail!("smoothing_window must be at least 1");
        }
        if controller.smoothing_window > MAX_SMOOTHING_WINDOW {
            anyhow::bail!(
                "smoothing_window ({}) must not exceed {MAX_SMOOTHING_WINDOW}",
                controller.smoothing_window
            );
        }
        if controller.cycle_interval_secs < 10 {
            anyhow::bail!("cycle_interval_secs must be at least 10 seconds");
        }
        if controller.io_timeout_secs == 0 {
            anyhow::bail!("io_timeout_secs must be positive");
        }
        if controller.io_timeout_secs >= controller.cycle_interval_secs {
            anyhow::bail!(
                "io_timeout_secs ({}) must be shorter than cycle_interval_secs ({})",
                controller.io_timeout_secs,
                controller.cycle_interval_secs
            );
        }

        if self.metrics.enabled {
            if self.metrics.url.trim().is_empty() {
                anyhow::bail!("metrics.url cannot be empty when metrics are enabled");
            }
            if self.metrics.database.trim().is_empty() {
                anyhow::bail!("metrics.database cannot be empty when metrics are enabled");
            }
        }
        if self.metrics.series.trim().is_empty() {
            anyhow::bail!("metrics.series cannot be empty");
        }

        if self.command.enabled && self.command.port == 0 {
            anyhow::bail!("command.port must be non-zero");
        }

        let mqtt = &self.command.mqtt;
        if mqtt.enabled {
            if mqtt.host.trim().is_empty() {
                anyhow::bail!("command.mqtt.host cannot be empty when MQTT is enabled");
            }
            if mqtt.port == 0 {
                anyhow::bail!("command.mqtt.port must be non-zero");
            }
            if mqtt.topic.trim().is_empty() || mqtt.topic.contains(['+', '#']) {
                anyhow::bail!("command.mqtt.topic must be a concrete topic without wildcards");
            }
            if mqtt.client_id.trim().is_empty() {
                anyhow::bail!("command.mqtt.client_id cannot be empty");
            }
        }

        Ok(())
    }

    /// Suspicious but accepted settings, reported once logging is up
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.switch.switch_entity.starts_with("switch.") {
            warnings.push(format!(
                "switch.switch_entity '{}' is not a switch.* entity, turn_on/turn_off may fail",
                self.switch.switch_entity
            ));
        }
        if self.command.mqtt.enabled && !self.command.enabled {
            warnings.push(
                "command.enabled is false, so MQTT is the only mode-change input".to_string(),
            );
        }
        warnings
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.controller.cycle_interval_secs)
    }

    pub fn is_debug_mode(&self) -> bool {
        self.system.debug_mode
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            cycle_interval: self.cycle_interval(),
            smoothing_window: self.controller.smoothing_window,
            io_timeout: Duration::from_secs(self.controller.io_timeout_secs),
            series: self.metrics.series.clone(),
            debug: DebugModeConfig {
                enabled: self.system.debug_mode,
            },
        }
    }

    pub fn meter_entities(&self) -> MeterEntities {
        MeterEntities {
            grid_power: self.meter.grid_power_entity.clone(),
            pv_power: self.meter.pv_power_entity.clone(),
            consumption: self.meter.consumption_entity.clone(),
            battery_soc: self.meter.battery_soc_entity.clone(),
            grid_power_positive_is_import: self.meter.grid_power_positive_is_import,
        }
    }

    pub fn switch_entities(&self) -> SwitchEntities {
        SwitchEntities {
            switch: self.switch.switch_entity.clone(),
            power: self.switch.power_entity.clone(),
            energy: self.switch.energy_entity.clone(),
            temperature: self.switch.temperature_entity.clone(),
        }
    }

    pub fn influx_settings(&self) -> InfluxSettings {
        InfluxSettings {
            url: self.metrics.url.clone(),
            database: self.metrics.database.clone(),
            username: self.metrics.username.clone(),
            password: self.metrics.password.clone(),
        }
    }

    pub fn mqtt_settings(&self) -> MqttSettings {
        let mqtt = &self.command.mqtt;
        MqttSettings {
            host: mqtt.host.clone(),
            port: mqtt.port,
            client_id: mqtt.client_id.clone(),
            topic: mqtt.topic.clone(),
            username: mqtt.username.clone(),
            password: mqtt.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn missing(dir: &tempfile::TempDir) -> std::path::PathBuf {
        dir.path().join("no_options.json")
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.controller.cycle_interval_secs, 120);
        assert_eq!(config.controller.smoothing_window, 5);
        assert_eq!(config.controller.io_timeout_secs, 10);
        assert!(config.meter.grid_power_positive_is_import);
        assert!(!config.metrics.enabled);
        assert_eq!(config.metrics.series, "ev_charger");
        assert!(config.command.enabled);
        assert_eq!(config.command.port, 8098);
        assert!(!config.command.mqtt.enabled);
        assert_eq!(config.command.mqtt.topic, "fluxev/change_state");
        assert!(config.system.debug_mode);

        assert!(config.validate().is_ok());
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_validate_empty_entity() {
        let mut config = AppConfig::default();
        config.switch.power_entity = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("switch.power_entity"));
    }

    #[test]
    fn test_validate_smoothing_window_zero() {
        let mut config = AppConfig::default();
        config.controller.smoothing_window = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_smoothing_window_upper_bound() {
        let mut config = AppConfig::default();
        config.controller.smoothing_window = MAX_SMOOTHING_WINDOW;
        assert!(config.validate().is_ok());

        config.controller.smoothing_window = MAX_SMOOTHING_WINDOW + 1;
        assert!(config.validate().unwrap_err().to_string().contains("must not exceed"));

        config.controller.smoothing_window = usize::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_switch_entity_is_a_warning_not_an_error() {
        let mut config = AppConfig::default();
        config.switch.switch_entity = "input_boolean.ev_charger".to_string();

        assert!(config.validate().is_ok());
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("input_boolean.ev_charger"));
    }

    #[test]
    fn test_validate_mqtt_only_when_enabled() {
        let mut config = AppConfig::default();
        config.command.mqtt.topic = "fluxev/#".to_string();
        config.command.mqtt.host = String::new();
        assert!(config.validate().is_ok());

        config.command.mqtt.enabled = true;
        assert!(config.validate().unwrap_err().to_string().contains("host"));

        config.command.mqtt.host = "broker.local".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("wildcards"));

        config.command.mqtt.topic = "pentling/ev_golf/change_state".to_string();
        assert!(config.validate().is_ok());

        config.command.mqtt.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mqtt_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[command]
enabled = false

[command.mqtt]
enabled = true
host = "broker.local"
topic = "pentling/ev_golf/change_state"
username = "fluxev"
password = "secret"
"#,
        )
        .unwrap();

        let (config, _) = AppConfig::load_from(&missing(&dir), dir.path()).unwrap();
        let settings = config.mqtt_settings();

        assert_eq!(settings.host, "broker.local");
        assert_eq!(settings.port, 1883);
        assert_eq!(settings.client_id, "fluxev");
        assert_eq!(settings.topic, "pentling/ev_golf/change_state");
        assert_eq!(settings.username.as_deref(), Some("fluxev"));
        assert_eq!(settings.password.as_deref(), Some("secret"));
        assert_eq!(config.warnings().len(), 1);
    }

    #[test]
    fn test_validate_cycle_interval_too_low() {
        let mut config = AppConfig::default();
        config.controller.cycle_interval_secs = 5;

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("at least 10 seconds")
        );
    }

    #[test]
    fn test_validate_io_timeout() {
        let mut config = AppConfig::default();
        config.controller.io_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.controller.io_timeout_secs = 120;
        assert!(config.validate().unwrap_err().to_string().contains("shorter"));

        config.controller.io_timeout_secs = 119;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_metrics_only_when_enabled() {
        let mut config = AppConfig::default();
        config.metrics.database = String::new();
        assert!(config.validate().is_ok());

        config.metrics.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_command_port() {
        let mut config = AppConfig::default();
        config.command.port = 0;
        assert!(config.validate().is_err());

        config.command.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DEBUG_MODE", "false"),
            ("CYCLE_INTERVAL_SECS", "60"),
            ("HA_BASE_URL", "http://ha.local:8123"),
            ("HA_TOKEN", "secret"),
        ]);
        let config =
            AppConfig::default().with_overrides(|key| env.get(key).map(ToString::to_string));

        assert!(!config.is_debug_mode());
        assert_eq!(config.cycle_interval(), Duration::from_secs(60));
        assert_eq!(config.system.ha_base_url.as_deref(), Some("http://ha.local:8123"));
        assert_eq!(config.system.ha_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let config = AppConfig::default().with_overrides(|key| match key {
            "DEBUG_MODE" => Some("maybe".to_string()),
            "CYCLE_INTERVAL_SECS" => Some("soon".to_string()),
            _ => None,
        });

        assert!(config.is_debug_mode());
        assert_eq!(config.controller.cycle_interval_secs, 120);
    }

    #[test]
    fn test_controller_settings() {
        let mut config = AppConfig::default();
        config.controller.smoothing_window = 3;
        config.metrics.series = "ev_golf".to_string();
        config.system.debug_mode = false;

        let settings = config.controller_settings();
        assert_eq!(settings.cycle_interval, Duration::from_secs(120));
        assert_eq!(settings.smoothing_window, 3);
        assert_eq!(settings.io_timeout, Duration::from_secs(10));
        assert_eq!(settings.series, "ev_golf");
        assert!(settings.debug.should_execute());
    }

    #[test]
    fn test_load_toml_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[controller]
cycle_interval_secs = 60

[switch]
switch_entity = "switch.garage_charger"
power_entity = "sensor.garage_charger_power"
energy_entity = "sensor.garage_charger_energy"
temperature_entity = "sensor.garage_charger_temperature"

[system]
debug_mode = false
"#,
        )
        .unwrap();

        let (config, source) = AppConfig::load_from(&missing(&dir), dir.path()).unwrap();

        assert_eq!(source, ConfigSource::Toml);
        assert_eq!(config.controller.cycle_interval_secs, 60);
        assert_eq!(config.controller.smoothing_window, 5);
        assert_eq!(config.switch.switch_entity, "switch.garage_charger");
        assert_eq!(config.meter.grid_power_entity, "sensor.grid_power");
        assert!(!config.system.debug_mode);
    }

    #[test]
    fn test_addon_options_take_priority() {
        let dir = tempfile::tempdir().unwrap();
        let options = dir.path().join("options.json");
        std::fs::write(
            &options,
            r#"{
                "controller": {"smoothing_window": 3},
                "metrics": {"enabled": true, "url": "http://influx:8086", "database": "pv"},
                "command": {"enabled": false}
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("config.toml"), "[controller]\nsmoothing_window = 9\n")
            .unwrap();

        let (config, source) = AppConfig::load_from(&options, dir.path()).unwrap();

        assert_eq!(source, ConfigSource::AddonOptions);
        assert_eq!(config.controller.smoothing_window, 3);
        assert!(config.metrics.enabled);
        assert_eq!(config.influx_settings().database, "pv");
        assert!(!config.command.enabled);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"controller": {"cycle_interval_secs": 3}}"#,
        )
        .unwrap();

        assert!(AppConfig::load_from(&missing(&dir), dir.path()).is_err());
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[controller\n").unwrap();

        let err = AppConfig::load_from(&missing(&dir), dir.path()).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_toml_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.metrics.username = Some("fluxev".to_string());
        config.meter.grid_power_positive_is_import = false;

        std::fs::write(
            dir.path().join("config.toml"),
            toml::to_string_pretty(&config).unwrap(),
        )
        .unwrap();
        let (reloaded, source) = AppConfig::load_from(&missing(&dir), dir.path()).unwrap();

        assert_eq!(source, ConfigSource::Toml);
        assert_eq!(reloaded.metrics.username.as_deref(), Some("fluxev"));
        assert!(!reloaded.meter.grid_power_positive_is_import);
    }

    #[test]
    fn test_json_serialization() {
        let config = AppConfig::default();
        let json_str = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json_str).unwrap();

        assert_eq!(config.switch.switch_entity, deserialized.switch.switch_entity);
        assert_eq!(config.system.debug_mode, deserialized.system.debug_mode);
    }
}
