//! Network drivers backed by the host

use crate::connection::NetworkDriver;
use crate::error::ConnectivityError;
use async_trait::async_trait;
use std::net::IpAddr;
use tokio::net::UdpSocket;
use tokio::process::Command;
use tracing::{debug, info};

/// Discover the address the host would use to reach `probe`
///
/// Connecting a UDP socket sends nothing; it only selects a route.
async fn route_address(probe: &str) -> Result<IpAddr, ConnectivityError> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| ConnectivityError::Network(e.to_string()))?;
    socket
        .connect(probe)
        .await
        .map_err(|e| ConnectivityError::Network(e.to_string()))?;
    let local = socket
        .local_addr()
        .map_err(|e| ConnectivityError::Network(e.to_string()))?;
    Ok(local.ip())
}

/// Driver for a host that is already online
///
/// Association only records the SSID and looks up the routable address.
#[derive(Debug)]
pub struct HostNetwork {
    probe: String,
    ssid: Option<String>,
    address: Option<IpAddr>,
}

impl HostNetwork {
    pub fn new(probe: impl Into<String>) -> Self {
        Self {
            probe: probe.into(),
            ssid: None,
            address: None,
        }
    }
}

impl Default for HostNetwork {
    fn default() -> Self {
        Self::new("8.8.8.8:53")
    }
}

#[async_trait]
impl NetworkDriver for HostNetwork {
    async fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        let address = route_address(&self.probe).await?;
        info!("[NET] Host online as {} (ssid {:?})", address, ssid);
        self.ssid = Some(ssid.to_string());
        self.address = Some(address);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectivityError> {
        self.ssid = None;
        self.address = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    fn address(&self) -> Option<IpAddr> {
        self.address
    }
}

/// Driver that associates through NetworkManager's `nmcli`
#[derive(Debug)]
pub struct NmcliNetwork {
    interface: Option<String>,
    probe: String,
    ssid: Option<String>,
    address: Option<IpAddr>,
}

impl NmcliNetwork {
    pub fn new(interface: Option<String>) -> Self {
        Self {
            interface,
            probe: "8.8.8.8:53".into(),
            ssid: None,
            address: None,
        }
    }

    async fn nmcli(&self, args: &[&str]) -> Result<String, ConnectivityError> {
        debug!("[NET] nmcli {}", args.first().copied().unwrap_or_default());
        let output = Command::new("nmcli")
            .args(args)
            .output()
            .await
            .map_err(|e| ConnectivityError::Network(format!("nmcli: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ConnectivityError::Network(
                stderr.lines().next().unwrap_or("nmcli failed").trim().to_string(),
            ))
        }
    }
}

#[async_trait]
impl NetworkDriver for NmcliNetwork {
    async fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        let mut args = vec!["device", "wifi", "connect", ssid, "password", password];
        if let Some(interface) = self.interface.as_deref() {
            args.extend(["ifname", interface]);
        }
        self.nmcli(&args).await?;

        let address = route_address(&self.probe).await?;
        info!("[NET] Associated with {:?} as {}", ssid, address);
        self.ssid = Some(ssid.to_string());
        self.address = Some(address);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectivityError> {
        let result = match (self.interface.clone(), self.ssid.clone()) {
            (Some(interface), _) => self.nmcli(&["device", "disconnect", &interface]).await,
            (None, Some(ssid)) => self.nmcli(&["connection", "down", "id", &ssid]).await,
            (None, None) => Ok(String::new()),
        };
        self.ssid = None;
        self.address = None;
        result.map(|_| ())
    }

    fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    fn address(&self) -> Option<IpAddr> {
        self.address
    }
}
