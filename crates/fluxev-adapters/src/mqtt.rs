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
use fluxev_core::CommandSource;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use std::time::Duration;
use tracing::{debug, info, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_CAPACITY: usize = 10;

/// Broker connection and the topic carrying mode-change codes
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MqttSettings {
    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(KEEP_ALIVE);
        if let Some(user) = &self.username {
            options.set_credentials(user, self.password.as_deref().unwrap_or_default());
        }
        options
    }
}

/// `CommandSource` subscribed to an MQTT topic
///
/// The event loop is driven from `next_code`, so the connection only makes
/// progress while the override listener is waiting for a code.
pub struct MqttCommandSource {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
}

impl std::fmt::Debug for MqttCommandSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttCommandSource")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl MqttCommandSource {
    pub fn new(settings: &MqttSettings) -> Self {
        let (client, eventloop) = AsyncClient::new(settings.options(), REQUEST_CAPACITY);
        info!(
            "📡 MQTT commands from {}:{} topic '{}'",
            settings.host, settings.port, settings.topic
        );
        Self {
            client,
            eventloop,
            topic: settings.topic.clone(),
        }
    }

    /// Sessions are clean, so the subscription is renewed on every ConnAck
    fn subscribe(&self) {
        match self.client.try_subscribe(&self.topic, QoS::AtLeastOnce) {
            Ok(()) => debug!("Subscribed to {}", self.topic),
            Err(e) => warn!("⚠️ MQTT subscribe to {} failed: {e}", self.topic),
        }
    }

    fn code_from(&self, publish: &Publish) -> Option<i64> {
        if publish.topic != self.topic {
            debug!("Ignoring MQTT message on {}", publish.topic);
            return None;
        }
        let code = parse_code(&publish.payload);
        if code.is_none() {
            warn!(
                "⚠️ Dropping MQTT payload on {}: {:?}",
                publish.topic,
                String::from_utf8_lossy(&publish.payload)
            );
        }
        code
    }
}

/// Decimal integer payload, surrounding whitespace allowed
fn parse_code(payload: &[u8]) -> Option<i64> {
    std::str::from_utf8(payload).ok()?.trim().parse().ok()
}

#[async_trait]
impl CommandSource for MqttCommandSource {
    async fn next_code(&mut self) -> Option<i64> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("📡 MQTT broker connected");
                    self.subscribe();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if let Some(code) = self.code_from(&publish) {
                        return Some(code);
                    }
                }
                Ok(Event::Incoming(_) | Event::Outgoing(_)) => {}
                Err(e) => {
                    warn!("⚠️ MQTT connection error: {e}, retrying in {RECONNECT_DELAY:?}");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "MQTT"
    }
}
