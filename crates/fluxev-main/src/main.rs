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

mod config;
mod version;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use config::{AppConfig, ConfigSource};
use fluxev_adapters::{
    HaMeterClient, HaSwitchClient, HomeAssistantClient, InfluxSink, LogSink, MqttCommandSource,
    command_channel,
};
use fluxev_core::{
    ChargeController, DebugModeConfig, MeterClient, MetricsSink, SwitchClient,
    run_override_listener,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("FluxEV - PV surplus EV charging");
                println!("Version: {}", version::VERSION);
                println!();
                println!("Usage: fluxev [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{}", version::VERSION);
                return Ok(());
            }
            _ => {}
        }
    }

    // Config is needed for the fallback log level, so it is loaded before tracing
    let (config, source) = AppConfig::load()?;

    // Respects RUST_LOG, otherwise system.log_level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.system.log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    info!("🚀 Starting FluxEV {} - PV surplus EV charging", version::VERSION);
    if source == ConfigSource::Defaults {
        warn!("No configuration file found, using defaults with environment overrides");
    }
    for warning in config.warnings() {
        warn!("⚠️ {}", warning);
    }
    info!("📋 Configuration Summary ({}):", source);
    info!(
        "   Meter: grid={} pv={} load={} soc={}",
        config.meter.grid_power_entity,
        config.meter.pv_power_entity,
        config.meter.consumption_entity,
        config.meter.battery_soc_entity
    );
    info!("   Switch: {}", config.switch.switch_entity);
    info!(
        "   Cycle: every {}s, smoothing window {}, I/O timeout {}s",
        config.controller.cycle_interval_secs,
        config.controller.smoothing_window,
        config.controller.io_timeout_secs
    );
    info!(
        "   Metrics: {}",
        if config.metrics.enabled {
            format!("InfluxDB {} db={}", config.metrics.url, config.metrics.database)
        } else {
            "log only".to_owned()
        }
    );
    if config.command.mqtt.enabled {
        info!(
            "   MQTT commands: {}:{} topic {}",
            config.command.mqtt.host, config.command.mqtt.port, config.command.mqtt.topic
        );
    }
    info!("   Debug mode: {}", config.system.debug_mode);

    if !config.is_debug_mode() {
        DebugModeConfig::warn_production_mode();
    }

    // Initialize Home Assistant client
    let ha_client = if config.system.ha_token.is_none() && std::env::var("SUPERVISOR_TOKEN").is_ok()
    {
        info!("🏠 Initializing HA client using Supervisor API...");
        HomeAssistantClient::from_supervisor()?
    } else {
        info!("🏠 Initializing HA client from configuration...");
        HomeAssistantClient::from_config(
            config.system.ha_base_url.clone(),
            config.system.ha_token.clone(),
        )?
    };
    if !ha_client.ping().await? {
        warn!("⚠️ Home Assistant API did not answer the health check");
    }

    let meter: Arc<dyn MeterClient> =
        Arc::new(HaMeterClient::new(ha_client.clone(), config.meter_entities()));
    let switch: Arc<dyn SwitchClient> =
        Arc::new(HaSwitchClient::new(ha_client, config.switch_entities()));
    let sink: Arc<dyn MetricsSink> = if config.metrics.enabled {
        Arc::new(InfluxSink::new(config.influx_settings())?)
    } else {
        Arc::new(LogSink)
    };
    info!(
        "🔌 Meter: {}, switch: {}, metrics: {}",
        meter.name(),
        switch.name(),
        sink.name()
    );

    let mut controller = ChargeController::new(meter, switch, sink, config.controller_settings());

    // One full acquisition before entering the loop; unreachable collaborators are fatal here only
    let snapshot = controller
        .check_connectivity()
        .await
        .context("Startup connectivity check failed")?;
    info!(
        "✅ Startup check: grid {:.0} W, PV {:.0} W, load {:.0} W, charger {:.0} W, SoC {:.0}%",
        snapshot.power_to_grid,
        snapshot.power_generated,
        snapshot.power_consumption,
        snapshot.power_to_load,
        snapshot.battery_soc
    );

    if config.command.enabled {
        let (api_state, commands) =
            command_channel(controller.status_board(), controller.override_slot());
        tokio::spawn(run_override_listener(commands, controller.override_sender()));

        let port = config.command.port;
        tokio::spawn(async move {
            if let Err(e) = fluxev_adapters::serve(api_state, port).await {
                error!("Command API stopped: {e:#}");
            }
        });
    } else {
        info!("Command API disabled");
    }

    if config.command.mqtt.enabled {
        let source = MqttCommandSource::new(&config.mqtt_settings());
        tokio::spawn(run_override_listener(source, controller.override_sender()));
    } else if !config.command.enabled {
        info!("No command inputs, mode stays {}", controller.mode());
    }

    controller.run(shutdown_signal()).await;

    info!("👋 FluxEV stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
