//! Collaborator traits for the network radio and the broker client

use crate::error::ConnectivityError;
use crate::session::ServiceIdentity;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

/// Network association driver (the WiFi radio)
#[async_trait]
pub trait NetworkDriver: Send {
    /// Associate with a network
    async fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;

    /// Drop the association
    async fn disconnect(&mut self) -> Result<(), ConnectivityError>;

    fn is_connected(&self) -> bool;

    /// Address assigned to this device, if associated
    fn address(&self) -> Option<IpAddr>;
}

/// A message received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

/// A publish/subscribe client bound to one broker session
#[async_trait]
pub trait BrokerClient: Send {
    async fn connect(&mut self) -> Result<(), ConnectivityError>;

    async fn disconnect(&mut self) -> Result<(), ConnectivityError>;

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), ConnectivityError>;

    async fn subscribe(&mut self, topic: &str) -> Result<(), ConnectivityError>;

    /// Service the connection for at most `timeout`, returning any messages
    /// that arrived on subscribed topics
    async fn service_once(
        &mut self,
        timeout: Duration,
    ) -> Result<Vec<InboundMessage>, ConnectivityError>;

    fn is_connected(&self) -> bool;
}

/// Factory for broker clients
pub trait BrokerConnector: Send + Sync {
    /// The client type this connector produces
    type Client: BrokerClient;

    /// Build a client for the given identity; does not connect
    fn build(
        &self,
        identity: &ServiceIdentity,
        client_id: &str,
    ) -> Result<Self::Client, ConnectivityError>;

    /// Human-readable name for this broker
    fn name(&self) -> &'static str;
}
