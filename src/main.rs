mod command;
mod config;
mod connection;
mod device;
mod engine;
mod error;
mod mqtt;
mod publish;
mod session;
mod transport;

#[cfg(test)]
mod testing;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Cli, EngineConfig, NetworkKind};
use connection::{ConnectivityManager, NetworkDriver};
use device::{FileStorage, HostNetwork, Indicator, LogIndicator, NmcliNetwork, StaticId, SysfsLed};
use engine::Engine;
use mqtt::MqttConnector;
use transport::{ByteLink, Link, SerialConnector, TcpConnector};

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MACHINE_ID: &str = "/etc/machine-id";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.port.is_none() && cli.tcp.is_none() {
        bail!("no controller link: pass --port <device> or --tcp <host:port>");
    }

    let engine_config = cli.engine_config();
    engine_config.validate()?;

    let hardware = match cli.hardware_id.as_deref() {
        Some(hex) => StaticId::from_hex(hex)?,
        None => StaticId::from_machine_id(MACHINE_ID)
            .context("no hardware id available; pass --hardware-id")?,
    };
    let client_id = device::client_id(&hardware);

    info!("Modem starting: {}", client_id);
    info!(
        "  Broker: {}:{}",
        cli.broker_host, cli.broker_port
    );
    info!("  Network: {:?}", cli.network);

    // RESET ends a session; everything is rebuilt as on a fresh boot
    loop {
        run_session(&cli, &engine_config, &client_id).await?;
        info!("[MAIN] Session ended by reset, rebooting");
    }
}

/// Build every collaborator and run one engine session until RESET
async fn run_session(cli: &Cli, config: &EngineConfig, client_id: &str) -> Result<()> {
    let link: Box<dyn ByteLink> = match (&cli.tcp, &cli.port) {
        (Some(address), _) => {
            info!("[MAIN] Controller via TCP bridge {}", address);
            Box::new(Link::new(TcpConnector::new(address.clone())))
        }
        (None, Some(port)) => {
            info!("[MAIN] Controller on {} at {} baud", port, cli.baud);
            Box::new(Link::new(SerialConnector::new(port.clone(), cli.baud)))
        }
        (None, None) => bail!("no controller link configured"),
    };

    let network: Box<dyn NetworkDriver> = match cli.network {
        NetworkKind::Host => Box::new(HostNetwork::default()),
        NetworkKind::Nmcli => Box::new(NmcliNetwork::new(cli.ifname.clone())),
    };

    let indicator: Box<dyn Indicator> = match &cli.led {
        Some(path) => Box::new(SysfsLed::new(path)),
        None => {
            warn!("[MAIN] No LED configured, indicator changes are only logged");
            Box::new(LogIndicator::default())
        }
    };

    let connectivity = ConnectivityManager::new(
        network,
        MqttConnector::new(cli.mqtt_config()),
        client_id.to_string(),
    );

    let mut engine = Engine::new(
        config.clone(),
        link,
        connectivity,
        Box::new(FileStorage::new(&cli.data_dir)),
        indicator,
    )?;
    engine.run().await
}

fn setup_logging(cli: &Cli) {
    let filter_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
