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

//! The charge-control loop
//!
//! One cycle: apply pending override → sample → estimate → smooth → decide →
//! actuate → publish. Cycles never overlap; the next tick is awaited only after
//! the previous cycle has published.

use crate::actuator::{SwitchActuator, SwitchCommand};
use crate::debug::DebugModeConfig;
use crate::error::ControlError;
use crate::mode::ChargeMode;
use crate::override_channel::{OverrideSender, OverrideSlot};
use crate::smoothing::SmoothingBuffer;
use crate::status::{CycleReport, StatusBoard};
use crate::telemetry::{TelemetrySnapshot, acquire_snapshot, bounded};
use crate::traits::{MeterClient, MetricsSink, SwitchClient};
use chrono::Utc;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Runtime settings for the control loop
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Period between cycle starts
    pub cycle_interval: Duration,
    /// Number of availability samples averaged before deciding
    pub smoothing_window: usize,
    /// Upper bound for every collaborator call
    pub io_timeout: Duration,
    /// Series name used for every metric
    pub series: String,
    pub debug: DebugModeConfig,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(120),
            smoothing_window: 5,
            io_timeout: Duration::from_secs(10),
            series: "ev_charger".to_string(),
            debug: DebugModeConfig::default(),
        }
    }
}

/// Result of one cycle
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Telemetry could not be trusted; nothing was decided or actuated
    Skipped(ControlError),
}

pub struct ChargeController {
    meter: Arc<dyn MeterClient>,
    switch: Arc<dyn SwitchClient>,
    sink: Arc<dyn MetricsSink>,
    actuator: SwitchActuator,
    mode: ChargeMode,
    buffer: SmoothingBuffer,
    overrides: OverrideSlot,
    status: StatusBoard,
    settings: ControllerSettings,
}

impl fmt::Debug for ChargeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChargeController")
            .field("meter", &self.meter.name())
            .field("switch", &self.switch.name())
            .field("sink", &self.sink.name())
            .field("mode", &self.mode)
            .field("buffer", &self.buffer)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChargeController {
    pub fn new(
        meter: Arc<dyn MeterClient>,
        switch: Arc<dyn SwitchClient>,
        sink: Arc<dyn MetricsSink>,
        settings: ControllerSettings,
    ) -> Self {
        let actuator =
            SwitchActuator::new(Arc::clone(&switch), settings.debug.clone(), settings.io_timeout);

        Self {
            meter,
            switch,
            sink,
            actuator,
            mode: ChargeMode::default(),
            buffer: SmoothingBuffer::new(settings.smoothing_window),
            overrides: OverrideSlot::new(),
            status: StatusBoard::new(),
            settings,
        }
    }

    /// Handle for override producers
    pub fn override_sender(&self) -> OverrideSender {
        self.overrides.sender()
    }

    pub fn override_slot(&self) -> OverrideSlot {
        self.overrides.clone()
    }

    pub fn status_board(&self) -> StatusBoard {
        self.status.clone()
    }

    pub fn mode(&self) -> ChargeMode {
        self.mode
    }

    pub fn buffer(&self) -> &SmoothingBuffer {
        &self.buffer
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Switch to the mode mapped from `code`
    pub fn apply_override(&mut self, code: u8) {
        let next = ChargeMode::from_code(code);
        if next == self.mode {
            debug!("Override {code} keeps mode {}", self.mode);
            return;
        }
        info!("🎛️ Mode change {} -> {} (code {code})", self.mode, next);
        self.mode = next;
    }

    /// One full telemetry pass, used to verify connectivity before the loop starts
    pub async fn check_connectivity(&self) -> crate::error::Result<TelemetrySnapshot> {
        acquire_snapshot(
            self.meter.as_ref(),
            self.switch.as_ref(),
            self.settings.io_timeout,
        )
        .await
    }

    /// Execute one control cycle
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        if let Some(code) = self.overrides.take() {
            self.apply_override(code);
        }

        let snapshot = match self.check_connectivity().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("⚠️ Skipping cycle in {} mode: {e}", self.mode);
                return CycleOutcome::Skipped(e);
            }
        };

        let decision = self.mode.evaluate(&snapshot);
        decision.apply_to(&mut self.buffer);
        let power_available = self.buffer.mean();
        let command = SwitchCommand::decide(power_available, decision.threshold);

        debug!(
            "Window {:?}, average power available: {power_available:.1} W",
            self.buffer.samples().collect::<Vec<_>>()
        );

        let reason = decision.reason.description();
        let actuated = match self.actuator.apply(command, reason).await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ {e}; will retry next cycle");
                false
            }
        };

        let report = CycleReport {
            timestamp: Utc::now(),
            mode: self.mode,
            reason: decision.reason,
            debug_code: decision.debug_code(),
            sample_w: decision.sample,
            power_available_w: power_available,
            threshold_w: decision.threshold,
            command,
            actuated,
            snapshot,
        };

        info!(
            "⚡ [{}] {} | sample {:.0} W, avg {:.0} W / {:.0} W -> {}",
            report.mode,
            reason,
            report.sample_w,
            report.power_available_w,
            report.threshold_w,
            report.command
        );

        self.publish(&report).await;
        self.status.update(report.clone());
        CycleOutcome::Completed(report)
    }

    /// Export the cycle to the metrics sink. Never fails the cycle.
    async fn publish(&self, report: &CycleReport) {
        self.write_metric("power_to_load", report.snapshot.power_to_load)
            .await;
        self.write_metric("energy_to_load", report.snapshot.energy_to_load)
            .await;
        self.write_metric("debug_code", f64::from(report.debug_code))
            .await;
        self.write_metric("power_available", report.power_available_w)
            .await;

        let timeout = self.settings.io_timeout;
        match bounded("switch_state", timeout, self.switch.get_state()).await {
            Ok(on) => {
                self.write_metric("switch_state", if on { 1.0 } else { 0.0 })
                    .await;
            }
            Err(e) => warn!("⚠️ Not publishing switch state: {e}"),
        }
        match bounded("switch_temperature", timeout, self.switch.get_temperature()).await {
            Ok(temperature) => self.write_metric("switch_temperature", temperature).await,
            Err(e) => warn!("⚠️ Not publishing switch temperature: {e}"),
        }
    }

    async fn write_metric(&self, field: &str, value: f64) {
        let series = self.settings.series.as_str();
        let result =
            tokio::time::timeout(self.settings.io_timeout, self.sink.write(series, field, value))
                .await;

        let reason = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("{e:#}"),
            Err(_) => "timed out".to_string(),
        };
        let err = ControlError::SinkWriteFailure {
            series: series.to_string(),
            field: field.to_string(),
            reason,
        };
        warn!("⚠️ {} ({})", err, self.sink.name());
    }

    /// Run cycles every `cycle_interval` until `shutdown` resolves
    ///
    /// Shutdown is only observed between cycles, so a started actuation
    /// always completes.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        info!(
            "🔁 Control loop started: every {}s, window {}, mode {}",
            self.settings.cycle_interval.as_secs(),
            self.buffer.capacity(),
            self.mode
        );

        let mut ticker = tokio::time::interval(self.settings.cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown wins over a tick that became ready during a long cycle
                biased;
                () = &mut shutdown => {
                    info!("Control loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }
}
