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

use super::errors::{HaError, HaResult};
use super::types::HaEntityState;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

const SUPERVISOR_URL: &str = "http://supervisor/core";
const LOCAL_URL: &str = "http://localhost:8123";

/// Home Assistant REST API client
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    http: Client,
    attempts: u32,
    backoff: Duration,
}

impl HomeAssistantClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            http,
            attempts: 3,
            backoff: Duration::from_millis(500),
        })
    }

    /// Client for an add-on talking to HA through the Supervisor proxy
    pub fn from_supervisor() -> HaResult<Self> {
        let token = std::env::var("SUPERVISOR_TOKEN").map_err(|_| {
            HaError::ConfigError(
                "SUPERVISOR_TOKEN is not set; FluxEV is not running as an HA add-on".to_owned(),
            )
        })?;

        info!("Connecting to Home Assistant via Supervisor");
        Self::new(SUPERVISOR_URL, token)
    }

    /// Client built from configuration, falling back to `HA_BASE_URL`/`HA_TOKEN`
    pub fn from_config(ha_base_url: Option<String>, ha_token: Option<String>) -> HaResult<Self> {
        let base_url = ha_base_url
            .or_else(|| std::env::var("HA_BASE_URL").ok())
            .unwrap_or_else(|| LOCAL_URL.to_owned());
        let token = ha_token
            .or_else(|| std::env::var("HA_TOKEN").ok())
            .ok_or_else(|| {
                HaError::ConfigError("No HA token in config or HA_TOKEN".to_owned())
            })?;

        info!("Connecting to Home Assistant at {}", base_url);
        Self::new(base_url, token)
    }

    /// Transport attempts per request (at least one) and the first backoff delay
    pub fn with_retry_config(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/states/<entity_id>`
    pub async fn get_state(&self, entity_id: &str) -> HaResult<HaEntityState> {
        let url = format!("{}/api/states/{entity_id}", self.base_url);
        let response = self.send(|| self.http.get(&url)).await?;

        match response.status() {
            StatusCode::OK => {
                let state: HaEntityState = response.json().await?;
                trace!("{} = '{}' {:?}", entity_id, state.state, state.unit());
                Ok(state)
            }
            StatusCode::NOT_FOUND => Err(HaError::EntityNotFound(entity_id.to_owned())),
            _ => Err(Self::status_error(response).await),
        }
    }

    /// `POST /api/services/<domain>/<service>` with `data` as body
    ///
    /// `service` is written as `domain.service`, e.g. `switch.turn_off`.
    pub async fn call_service(&self, service: &str, data: Value) -> HaResult<()> {
        let (domain, name) = split_service(service).ok_or_else(|| HaError::ServiceCallFailed {
            service: service.to_owned(),
            reason: "expected 'domain.service'".to_owned(),
        })?;

        let url = format!("{}/api/services/{domain}/{name}", self.base_url);
        debug!("Calling {} with {}", service, data);
        let response = self.send(|| self.http.post(&url).json(&data)).await?;

        if response.status().is_success() {
            return Ok(());
        }
        match Self::status_error(response).await {
            HaError::ApiError { status, message } => Err(HaError::ServiceCallFailed {
                service: service.to_owned(),
                reason: format!("status {status}: {message}"),
            }),
            other => Err(other),
        }
    }

    /// `GET /api/`; transport errors count as unhealthy, not as failures
    pub async fn ping(&self) -> HaResult<bool> {
        let url = format!("{}/api/", self.base_url);
        match self.authorized(self.http.get(&url)).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Home Assistant health check returned {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Home Assistant unreachable: {}", e);
                Ok(false)
            }
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// Send a freshly built request, retrying transport errors with doubling backoff
    ///
    /// HTTP error statuses are returned as responses, never retried.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> HaResult<Response> {
        let mut delay = self.backoff;
        let mut attempt = 1;
        loop {
            match self.authorized(build()).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "HA request failed ({}/{}): {}, retrying in {:?}",
                        attempt, self.attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(HaError::HttpError(e)),
            }
        }
    }

    async fn status_error(response: Response) -> HaError {
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return HaError::AuthenticationFailed;
        }
        HaError::ApiError {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }
    }
}

fn split_service(service: &str) -> Option<(&str, &str)> {
    service
        .split_once('.')
        .filter(|(domain, name)| !domain.is_empty() && !name.is_empty() && !name.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_split_service() {
        assert_eq!(split_service("switch.turn_on"), Some(("switch", "turn_on")));
        assert_eq!(split_service("invalid"), None);
        assert_eq!(split_service(".turn_on"), None);
        assert_eq!(split_service("switch."), None);
        assert_eq!(split_service("a.b.c"), None);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = HomeAssistantClient::new("http://ha.local:8123/", "token").unwrap();
        assert_eq!(client.base_url(), "http://ha.local:8123");
    }

    #[tokio::test]
    async fn test_get_state() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.grid_power")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "entity_id": "sensor.grid_power",
                    "state": "-0.35",
                    "attributes": {"unit_of_measurement": "kW"},
                    "last_changed": "2025-10-02T10:00:00Z",
                    "last_updated": "2025-10-02T10:00:00Z"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let state = client.get_state("sensor.grid_power").await.unwrap();

        assert_eq!(state.entity_id, "sensor.grid_power");
        assert_eq!(state.power_w().unwrap(), -350.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_state_error_statuses() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/states/sensor.missing")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/api/states/sensor.private")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("GET", "/api/states/sensor.broken")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();

        assert!(matches!(
            client.get_state("sensor.missing").await,
            Err(HaError::EntityNotFound(_))
        ));
        assert!(matches!(
            client.get_state("sensor.private").await,
            Err(HaError::AuthenticationFailed)
        ));
        assert!(matches!(
            client.get_state("sensor.broken").await,
            Err(HaError::ApiError { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_call_service() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/switch/turn_off")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::Json(json!({"entity_id": "switch.ev_charger"})))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        client
            .call_service("switch.turn_off", json!({"entity_id": "switch.ev_charger"}))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_service_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/services/switch/turn_on")
            .with_status(400)
            .with_body("entity not available")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.call_service("switch.turn_on", json!({})).await;

        match result {
            Err(HaError::ServiceCallFailed { service, reason }) => {
                assert_eq!(service, "switch.turn_on");
                assert!(reason.contains("400"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_service_invalid_format() {
        let client = HomeAssistantClient::new("http://localhost", "token").unwrap();
        let result = client.call_service("turn_on", json!({})).await;
        assert!(matches!(result, Err(HaError::ServiceCallFailed { .. })));
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        assert!(client.ping().await.unwrap());

        let offline = HomeAssistantClient::new("http://127.0.0.1:9", "token").unwrap();
        assert!(!offline.ping().await.unwrap());
    }

    #[tokio::test]
    async fn test_transport_error_after_retries() {
        let client = HomeAssistantClient::new("http://127.0.0.1:9", "token")
            .unwrap()
            .with_retry_config(2, Duration::from_millis(1));

        let result = client.get_state("sensor.grid_power").await;
        assert!(matches!(result, Err(HaError::HttpError(_))));
    }
}
