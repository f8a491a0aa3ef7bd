//! Command line and runtime configuration

use crate::mqtt::MqttConfig;
use crate::transport::DEFAULT_BAUD;
use aio_modem_shared::limits::MIN_PUBLISH_INTERVAL_MS;
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// How the modem reaches the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NetworkKind {
    /// The host is already online; WiFi credentials are only recorded
    Host,
    /// Associate through NetworkManager
    Nmcli,
}

#[derive(Parser, Debug)]
#[command(name = "aio-modem")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Serial device wired to the controller (e.g. /dev/ttyUSB0)
    #[arg(short, long, env = "MODEM_PORT", conflicts_with = "tcp")]
    pub port: Option<String>,

    /// Serial speed
    #[arg(short, long, env = "MODEM_BAUD", default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Reach the controller through a TCP bridge instead (host:port)
    #[arg(long, env = "MODEM_TCP")]
    pub tcp: Option<String>,

    /// MQTT broker host
    #[arg(long, env = "MODEM_BROKER_HOST", default_value = "io.adafruit.com")]
    pub broker_host: String,

    /// MQTT broker port
    #[arg(long, env = "MODEM_BROKER_PORT", default_value_t = 1883)]
    pub broker_port: u16,

    /// MQTT keep-alive in seconds
    #[arg(long, env = "MODEM_KEEP_ALIVE", default_value_t = 30)]
    pub keep_alive: u64,

    /// Network driver
    #[arg(long, value_enum, env = "MODEM_NETWORK", default_value = "host")]
    pub network: NetworkKind,

    /// Wireless interface for nmcli (default: let NetworkManager pick)
    #[arg(long, env = "MODEM_IFNAME")]
    pub ifname: Option<String>,

    /// Directory holding the saved configuration record
    #[arg(long, env = "MODEM_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// sysfs LED directory (e.g. /sys/class/leds/led0); logged only if unset
    #[arg(long, env = "MODEM_LED")]
    pub led: Option<PathBuf>,

    /// Hardware id as hex (default: /etc/machine-id)
    #[arg(long, env = "MODEM_HARDWARE_ID")]
    pub hardware_id: Option<String>,

    /// Serial read timeout in milliseconds
    #[arg(long, default_value_t = 50)]
    pub read_timeout_ms: u64,

    /// Broker maintenance wait in milliseconds (must be >= read timeout)
    #[arg(long, default_value_t = 200)]
    pub maintenance_ms: u64,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            host: self.broker_host.clone(),
            port: self.broker_port,
            keep_alive: Duration::from_secs(self.keep_alive),
            ..MqttConfig::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            maintenance_timeout: Duration::from_millis(self.maintenance_ms),
            ..EngineConfig::default()
        }
    }
}

/// Engine timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bounded wait for controller bytes each iteration
    pub read_timeout: Duration,
    /// Bounded wait when servicing the broker each iteration
    pub maintenance_timeout: Duration,
    /// Minimum spacing between allowed publishes
    pub publish_interval: Duration,
    /// Delay between reporting `OK:RESET` and restarting
    pub reset_delay: Duration,
    /// Pause after a loop failure before resuming
    pub recovery_pause: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(50),
            maintenance_timeout: Duration::from_millis(200),
            publish_interval: Duration::from_millis(MIN_PUBLISH_INTERVAL_MS),
            reset_delay: Duration::from_millis(250),
            recovery_pause: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    /// Maintenance must wait at least as long as a read
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout.is_zero() {
            bail!("read timeout must be positive");
        }
        if self.maintenance_timeout < self.read_timeout {
            bail!(
                "maintenance timeout ({:?}) is shorter than the read timeout ({:?})",
                self.maintenance_timeout,
                self.read_timeout
            );
        }
        Ok(())
    }
}
