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

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use fluxev_core::{CommandSource, CycleReport, OverrideSlot, StatusBoard};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Codes buffered between the API and the override listener
pub const COMMAND_QUEUE_DEPTH: usize = 16;

/// Shared state for the command endpoints
#[derive(Clone, Debug)]
pub struct CommandApiState {
    pub commands: mpsc::Sender<i64>,
    pub status: StatusBoard,
    pub overrides: OverrideSlot,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub code: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub report: CycleReport,
    pub pending_override: Option<u8>,
}

/// `CommandSource` fed by `POST /api/mode`
#[derive(Debug)]
pub struct HttpCommandSource {
    receiver: mpsc::Receiver<i64>,
}

impl HttpCommandSource {
    pub fn new(receiver: mpsc::Receiver<i64>) -> Self {
        Self { receiver }
    }
}

#[async_trait]
impl CommandSource for HttpCommandSource {
    async fn next_code(&mut self) -> Option<i64> {
        self.receiver.recv().await
    }

    fn name(&self) -> &str {
        "HTTP command API"
    }
}

/// Build the API state together with the matching command source
pub fn command_channel(
    status: StatusBoard,
    overrides: OverrideSlot,
) -> (CommandApiState, HttpCommandSource) {
    let (commands, receiver) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    (
        CommandApiState {
            commands,
            status,
            overrides,
        },
        HttpCommandSource::new(receiver),
    )
}

/// POST /api/mode
///
/// Range checking happens in the override channel, so any integer is accepted here.
async fn mode_handler(
    State(state): State<CommandApiState>,
    Json(request): Json<ModeRequest>,
) -> Response {
    debug!("Mode change requested: {}", request.code);
    match state.commands.try_send(request.code) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(TrySendError::Full(code)) => {
            warn!("Command queue full, dropping code {}", code);
            (StatusCode::SERVICE_UNAVAILABLE, "command queue full").into_response()
        }
        Err(TrySendError::Closed(code)) => {
            warn!("Override listener stopped, dropping code {}", code);
            (StatusCode::SERVICE_UNAVAILABLE, "override listener stopped").into_response()
        }
    }
}

/// GET /api/status
async fn status_handler(State(state): State<CommandApiState>) -> Response {
    match state.status.latest() {
        Some(report) => Json(StatusResponse {
            report,
            pending_override: state.overrides.peek(),
        })
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn command_routes(state: CommandApiState) -> Router {
    Router::new()
        .route("/api/mode", post(mode_handler))
        .route("/api/status", get(status_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
}

/// Serve the command API until the listener fails
pub async fn serve(state: CommandApiState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    info!("🌐 Starting command API on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, command_routes(state)).await?;

    Ok(())
}
