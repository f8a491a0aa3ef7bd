//! Connectivity manager: network association, broker session and recovery

use super::traits::{BrokerClient, BrokerConnector, NetworkDriver};
use crate::error::ConnectivityError;
use crate::session::{ServiceIdentity, SessionState, WifiCredentials};
use aio_modem_shared::state_machine::TransitionResult;
use aio_modem_shared::{ConnectivityEvent, ConnectivityStateMachine, Reply};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns the network driver and the (memoized) broker client
pub struct ConnectivityManager<C: BrokerConnector> {
    network: Box<dyn NetworkDriver>,
    connector: C,
    /// Built on the first broker connect, dropped only by recovery/teardown
    client: Option<C::Client>,
    client_id: String,
    fsm: ConnectivityStateMachine,
}

impl<C: BrokerConnector> ConnectivityManager<C> {
    /// Create a new manager; nothing is connected yet
    pub fn new(network: Box<dyn NetworkDriver>, connector: C, client_id: String) -> Self {
        Self {
            network,
            connector,
            client: None,
            client_id,
            fsm: ConnectivityStateMachine::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> aio_modem_shared::ConnectivityState {
        self.fsm.state()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn net_up(&self) -> bool {
        self.network.is_connected()
    }

    pub fn address(&self) -> Option<IpAddr> {
        if self.network.is_connected() {
            self.network.address()
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn broker_up(&self) -> bool {
        self.client.as_ref().is_some_and(|c| c.is_connected())
    }

    /// Associate with the network using the stored credentials
    pub async fn connect_network(
        &mut self,
        wifi: Option<&WifiCredentials>,
    ) -> Result<Option<IpAddr>, ConnectivityError> {
        if self.network.is_connected() {
            self.transition(ConnectivityEvent::NetConnected);
            return Ok(self.network.address());
        }

        let wifi = wifi
            .filter(|w| !w.ssid.is_empty() && !w.password.is_empty())
            .ok_or(ConnectivityError::MissingCredentials)?;

        info!("[NET] Connecting to {:?}", wifi.ssid);
        self.transition(ConnectivityEvent::NetConnectStarted);

        match self.network.connect(&wifi.ssid, &wifi.password).await {
            Ok(()) => {
                self.transition(ConnectivityEvent::NetConnected);
                let address = self.network.address();
                info!("[NET] Connected, address {:?}", address);
                Ok(address)
            }
            Err(e) => {
                warn!("[NET] Connect failed: {}", e);
                self.transition(ConnectivityEvent::NetFailed);
                Err(e)
            }
        }
    }

    /// Connect to the broker, building the client on first use
    pub async fn connect_broker(
        &mut self,
        identity: Option<&ServiceIdentity>,
    ) -> Result<(), ConnectivityError> {
        let identity = identity
            .filter(|id| !id.user.is_empty() && !id.key.is_empty())
            .ok_or(ConnectivityError::MissingIdentity)?;

        if self.client.is_none() {
            debug!(
                "[BROKER] Building {} client {}",
                self.connector.name(),
                self.client_id
            );
            self.client = Some(self.connector.build(identity, &self.client_id)?);
        }

        info!("[BROKER] Connecting as {}", identity.user);
        self.transition(ConnectivityEvent::BrokerConnectStarted);

        let client = self.client.as_mut().ok_or(ConnectivityError::NotConnected)?;
        match client.connect().await {
            Ok(()) => {
                self.transition(ConnectivityEvent::BrokerConnected);
                info!("[BROKER] Connected");
                Ok(())
            }
            Err(e) => {
                warn!("[BROKER] Connect failed: {}", e);
                self.transition(ConnectivityEvent::BrokerFailed);
                Err(e)
            }
        }
    }

    /// Network connect followed, on success, by broker connect
    ///
    /// Used by CONNECT and by the recovery path; every outcome is a reply.
    pub async fn connect(&mut self, session: &SessionState) -> Vec<Reply> {
        let address = match self.connect_network(session.wifi()).await {
            Ok(address) => address,
            Err(e) => return vec![Reply::err("NET", e.to_string())],
        };

        let mut replies = vec![Reply::ok_with(
            "NET",
            address.map_or_else(|| "none".to_string(), |a| a.to_string()),
        )];

        replies.push(match self.connect_broker(session.identity()).await {
            Ok(()) => Reply::ok("BROKER"),
            Err(e) => Reply::err("BROKER", e.to_string()),
        });

        replies
    }

    pub async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), ConnectivityError> {
        let client = self.client.as_mut().ok_or(ConnectivityError::NotConnected)?;
        client.publish(topic, payload).await
    }

    pub async fn subscribe(&mut self, topic: &str) -> Result<(), ConnectivityError> {
        let client = self.client.as_mut().ok_or(ConnectivityError::NotConnected)?;
        client.subscribe(topic).await
    }

    /// Service the broker client once; on failure run the recovery path
    ///
    /// Recovery is level-triggered: it runs on every call while servicing
    /// keeps failing, with no backoff.
    pub async fn maintain(&mut self, session: &SessionState, timeout: Duration) -> Vec<Reply> {
        let Some(client) = self.client.as_mut() else {
            return Vec::new();
        };

        let error = match client.service_once(timeout).await {
            Ok(messages) => {
                return messages
                    .into_iter()
                    .map(|m| Reply::Inbound {
                        topic: m.topic,
                        payload: m.payload,
                    })
                    .collect();
            }
            Err(e) => e,
        };

        warn!("[BROKER] Service failed, reconnecting: {}", error);
        let mut replies = vec![Reply::err("BROKER", format!("LOOP:{error}"))];

        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.disconnect().await {
                debug!("[BROKER] Disconnect during recovery failed: {}", e);
            }
        }
        self.transition(ConnectivityEvent::BrokerLost);

        replies.extend(self.connect(session).await);
        replies
    }

    /// Drop the broker client and the network association, best effort
    pub async fn teardown(&mut self) {
        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.disconnect().await {
                debug!("[BROKER] Disconnect during teardown failed: {}", e);
            }
        }
        if self.network.is_connected() {
            if let Err(e) = self.network.disconnect().await {
                debug!("[NET] Disconnect during teardown failed: {}", e);
            }
        }
        self.transition(ConnectivityEvent::TornDown);
    }

    fn transition(&mut self, event: ConnectivityEvent) {
        let from = self.fsm.state();
        match self.fsm.process_event(event) {
            TransitionResult::Success(to) if to != from => {
                debug!("[CONN] {:?} -> {:?} on {:?}", from, to, event);
            }
            TransitionResult::Success(_) => {}
            TransitionResult::Invalid { from, event } => {
                warn!("[CONN] Ignoring {:?} in {:?}", event, from);
            }
        }
    }
}
