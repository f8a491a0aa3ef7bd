//! Connectivity management
//!
//! This module handles:
//! - Network association with the stored WiFi credentials
//! - The broker session, built once and reused across reconnects
//! - Servicing the broker and the single automatic recovery path

mod manager;
pub mod traits;

pub use manager::ConnectivityManager;
pub use traits::{BrokerClient, BrokerConnector, InboundMessage, NetworkDriver};
