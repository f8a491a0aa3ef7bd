//! rumqttc-backed broker client
//!
//! rumqttc splits a session into an `AsyncClient` request handle and an
//! `EventLoop` that does the actual I/O. Requests are queued on the handle
//! and only hit the wire while the event loop is polled, which here happens
//! in `connect` and `service_once`.

use crate::connection::{BrokerClient, BrokerConnector, InboundMessage};
use crate::error::ConnectivityError;
use crate::session::ServiceIdentity;
use aio_modem_shared::limits::MAX_LINE_LEN;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Requests that may be queued between event loop polls
///
/// A burst line of `MAX_LINE_LEN` bytes holds at most `MAX_LINE_LEN / 2`
/// values, each queued as one publish before the loop is polled again.
const REQUEST_CAPACITY: usize = MAX_LINE_LEN;

/// Broker endpoint settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    /// How long `connect` waits for the CONNACK
    pub connect_timeout: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "io.adafruit.com".into(),
            port: 1883,
            keep_alive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Builds [`MqttBroker`] clients for one broker
#[derive(Debug, Clone, Default)]
pub struct MqttConnector {
    config: MqttConfig,
}

impl MqttConnector {
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }
}

impl BrokerConnector for MqttConnector {
    type Client = MqttBroker;

    fn build(
        &self,
        identity: &ServiceIdentity,
        client_id: &str,
    ) -> Result<MqttBroker, ConnectivityError> {
        if client_id.is_empty() {
            return Err(ConnectivityError::Broker("empty client id".into()));
        }

        let mut options = MqttOptions::new(client_id, &self.config.host, self.config.port);
        options
            .set_credentials(&identity.user, &identity.key)
            .set_keep_alive(self.config.keep_alive)
            .set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        debug!(
            "[BROKER] Client {} for {}:{}",
            client_id, self.config.host, self.config.port
        );

        Ok(MqttBroker {
            client,
            eventloop,
            connected: false,
            connect_timeout: self.config.connect_timeout,
        })
    }

    fn name(&self) -> &'static str {
        "MQTT"
    }
}

/// One broker session
pub struct MqttBroker {
    client: AsyncClient,
    eventloop: EventLoop,
    connected: bool,
    connect_timeout: Duration,
}

impl MqttBroker {
    fn lost(&mut self, detail: impl ToString) -> ConnectivityError {
        self.connected = false;
        ConnectivityError::Broker(detail.to_string())
    }
}

#[async_trait]
impl BrokerClient for MqttBroker {
    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        let deadline = Instant::now() + self.connect_timeout;
        loop {
            match timeout_at(deadline, self.eventloop.poll()).await {
                Err(_) => return Err(self.lost("CONNACK timeout")),
                Ok(Err(e)) => return Err(self.lost(e)),
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    info!("[BROKER] Session open ({:?})", ack.code);
                    self.connected = true;
                    return Ok(());
                }
                Ok(Ok(event)) => debug!("[BROKER] Before CONNACK: {:?}", event),
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), ConnectivityError> {
        let was_connected = std::mem::replace(&mut self.connected, false);
        if !was_connected {
            return Ok(());
        }
        self.client
            .try_disconnect()
            .map_err(|e| ConnectivityError::Broker(e.to_string()))?;
        // Flush the DISCONNECT; the broker closing the socket is expected
        let _ = timeout_at(Instant::now() + Duration::from_millis(100), self.eventloop.poll()).await;
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), ConnectivityError> {
        if !self.connected {
            return Err(ConnectivityError::NotConnected);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| ConnectivityError::Broker(e.to_string()))
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), ConnectivityError> {
        if !self.connected {
            return Err(ConnectivityError::NotConnected);
        }
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| ConnectivityError::Broker(e.to_string()))
    }

    async fn service_once(
        &mut self,
        timeout: Duration,
    ) -> Result<Vec<InboundMessage>, ConnectivityError> {
        if !self.connected {
            return Err(ConnectivityError::NotConnected);
        }

        let deadline = Instant::now() + timeout;
        let mut inbound = Vec::new();
        loop {
            match timeout_at(deadline, self.eventloop.poll()).await {
                Err(_) => return Ok(inbound),
                Ok(Err(e)) => {
                    warn!("[BROKER] Connection error: {}", e);
                    return Err(self.lost(e));
                }
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    inbound.push(InboundMessage {
                        topic: publish.topic.clone(),
                        payload: String::from_utf8_lossy(&publish.payload).into_owned(),
                    });
                    // Hand messages over promptly rather than waiting out the window
                    return Ok(inbound);
                }
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    return Err(self.lost("broker closed session"));
                }
                Ok(Ok(_)) => {}
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
