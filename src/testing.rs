//! In-memory collaborators for unit tests
//!
//! Each mock hands out a probe sharing its state, so a test can script
//! failures and inspect calls after the mock has been moved into the code
//! under test.

use crate::command::{CommandExecutor, CommandOutput, HandlerContext};
use crate::connection::{
    BrokerClient, BrokerConnector, ConnectivityManager, InboundMessage, NetworkDriver,
};
use crate::device::{Indicator, Storage};
use crate::error::{ConnectivityError, StorageError};
use crate::publish::PublishLimiter;
use crate::session::{ServiceIdentity, SessionState};
use crate::transport::ByteLink;
use aio_modem_shared::limits::MIN_PUBLISH_INTERVAL_MS;
use aio_modem_shared::{parse_line, ParsedLine};
use anyhow::bail;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(shared: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    shared.lock().unwrap()
}

/// Take one scripted failure, if any are left
fn take(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------- storage

#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn put(&self, name: &str, bytes: &[u8]) {
        self.records
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.records
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::Read {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such record"),
            })
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "flash full"),
            });
        }
        self.put(name, bytes);
        Ok(())
    }
}

// ---------------------------------------------------------------- network

#[derive(Debug, Default)]
struct NetworkShared {
    connected: bool,
    connect_calls: usize,
    disconnect_calls: usize,
    fail_connects: usize,
}

pub struct MockNetwork {
    shared: Arc<Mutex<NetworkShared>>,
}

#[derive(Clone)]
pub struct NetworkProbe {
    shared: Arc<Mutex<NetworkShared>>,
}

impl MockNetwork {
    pub fn new() -> (Self, NetworkProbe) {
        let shared = Arc::new(Mutex::new(NetworkShared::default()));
        (
            Self {
                shared: shared.clone(),
            },
            NetworkProbe { shared },
        )
    }
}

impl NetworkProbe {
    pub fn connect_calls(&self) -> usize {
        lock(&self.shared).connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        lock(&self.shared).disconnect_calls
    }

    pub fn fail_connects(&self, count: usize) {
        lock(&self.shared).fail_connects = count;
    }
}

#[async_trait]
impl NetworkDriver for MockNetwork {
    async fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        let mut shared = lock(&self.shared);
        shared.connect_calls += 1;
        if take(&mut shared.fail_connects) {
            return Err(ConnectivityError::Network("association failed".into()));
        }
        shared.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectivityError> {
        let mut shared = lock(&self.shared);
        shared.disconnect_calls += 1;
        shared.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        lock(&self.shared).connected
    }

    fn address(&self) -> Option<IpAddr> {
        self.is_connected()
            .then_some(IpAddr::V4(Ipv4Addr::new(192, 168, 4, 2)))
    }
}

// ---------------------------------------------------------------- broker

#[derive(Debug, Default)]
struct BrokerShared {
    builds: usize,
    client_ids: Vec<String>,
    connect_calls: usize,
    disconnect_calls: usize,
    service_calls: usize,
    fail_connects: usize,
    fail_services: usize,
    fail_publishes: usize,
    published: Vec<(String, String)>,
    subscriptions: Vec<String>,
    inbound: VecDeque<InboundMessage>,
}

pub struct MockConnector {
    shared: Arc<Mutex<BrokerShared>>,
}

pub struct MockBroker {
    shared: Arc<Mutex<BrokerShared>>,
    connected: bool,
}

#[derive(Clone)]
pub struct BrokerProbe {
    shared: Arc<Mutex<BrokerShared>>,
}

impl MockConnector {
    pub fn new() -> (Self, BrokerProbe) {
        let shared = Arc::new(Mutex::new(BrokerShared::default()));
        (
            Self {
                shared: shared.clone(),
            },
            BrokerProbe { shared },
        )
    }
}

impl BrokerProbe {
    pub fn builds(&self) -> usize {
        lock(&self.shared).builds
    }

    pub fn client_ids(&self) -> Vec<String> {
        lock(&self.shared).client_ids.clone()
    }

    pub fn connect_calls(&self) -> usize {
        lock(&self.shared).connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        lock(&self.shared).disconnect_calls
    }

    pub fn service_calls(&self) -> usize {
        lock(&self.shared).service_calls
    }

    pub fn published(&self) -> Vec<(String, String)> {
        lock(&self.shared).published.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.shared).subscriptions.clone()
    }

    pub fn fail_connects(&self, count: usize) {
        lock(&self.shared).fail_connects = count;
    }

    pub fn fail_services(&self, count: usize) {
        lock(&self.shared).fail_services = count;
    }

    pub fn fail_publishes(&self, count: usize) {
        lock(&self.shared).fail_publishes = count;
    }

    pub fn queue_inbound(&self, topic: &str, payload: &str) {
        lock(&self.shared).inbound.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
    }
}

impl BrokerConnector for MockConnector {
    type Client = MockBroker;

    fn build(
        &self,
        _identity: &ServiceIdentity,
        client_id: &str,
    ) -> Result<MockBroker, ConnectivityError> {
        let mut shared = lock(&self.shared);
        shared.builds += 1;
        shared.client_ids.push(client_id.to_string());
        Ok(MockBroker {
            shared: self.shared.clone(),
            connected: false,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[async_trait]
impl BrokerClient for MockBroker {
    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        let mut shared = lock(&self.shared);
        shared.connect_calls += 1;
        if take(&mut shared.fail_connects) {
            return Err(ConnectivityError::Broker("connect refused".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectivityError> {
        lock(&self.shared).disconnect_calls += 1;
        self.connected = false;
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), ConnectivityError> {
        if !self.connected {
            return Err(ConnectivityError::NotConnected);
        }
        let mut shared = lock(&self.shared);
        if take(&mut shared.fail_publishes) {
            return Err(ConnectivityError::Broker("publish rejected".into()));
        }
        shared
            .published
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), ConnectivityError> {
        if !self.connected {
            return Err(ConnectivityError::NotConnected);
        }
        lock(&self.shared).subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn service_once(
        &mut self,
        _timeout: Duration,
    ) -> Result<Vec<InboundMessage>, ConnectivityError> {
        let mut shared = lock(&self.shared);
        shared.service_calls += 1;
        if take(&mut shared.fail_services) {
            self.connected = false;
            return Err(ConnectivityError::Broker("link dropped".into()));
        }
        if !self.connected {
            return Err(ConnectivityError::NotConnected);
        }
        Ok(shared.inbound.drain(..).collect())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// A manager whose network and broker are already up for `session`
pub async fn connected_manager(
    session: &SessionState,
) -> (ConnectivityManager<MockConnector>, BrokerProbe) {
    let (network, _) = MockNetwork::new();
    let (connector, probe) = MockConnector::new();
    let mut manager = ConnectivityManager::new(Box::new(network), connector, "modem-0a0b".into());
    let replies = manager.connect(session).await;
    assert!(
        replies.iter().all(|r| !r.is_err()),
        "connect failed: {replies:?}"
    );
    (manager, probe)
}

// ---------------------------------------------------------------- indicator

#[derive(Debug, Default)]
pub struct RecordingIndicator {
    history: Vec<bool>,
    fail_next: bool,
}

impl RecordingIndicator {
    pub fn history(&self) -> Vec<bool> {
        self.history.clone()
    }

    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl Indicator for RecordingIndicator {
    fn set(&mut self, on: bool) -> anyhow::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            bail!("gpio busy");
        }
        self.history.push(on);
        Ok(())
    }
}

// ---------------------------------------------------------------- link

#[derive(Debug, Default)]
struct LinkShared {
    incoming: VecDeque<u8>,
    written: Vec<String>,
    fail_reads: usize,
}

/// Controller link fed from a byte queue
pub struct ScriptedLink {
    shared: Arc<Mutex<LinkShared>>,
}

#[derive(Clone)]
pub struct LinkProbe {
    shared: Arc<Mutex<LinkShared>>,
}

impl ScriptedLink {
    pub fn new() -> (Self, LinkProbe) {
        let shared = Arc::new(Mutex::new(LinkShared::default()));
        (
            Self {
                shared: shared.clone(),
            },
            LinkProbe { shared },
        )
    }
}

impl LinkProbe {
    /// Queue bytes from the controller
    pub fn push(&self, bytes: &[u8]) {
        lock(&self.shared).incoming.extend(bytes);
    }

    /// Lines written to the controller so far
    pub fn written(&self) -> Vec<String> {
        lock(&self.shared).written.clone()
    }

    pub fn fail_reads(&self, count: usize) {
        lock(&self.shared).fail_reads = count;
    }
}

#[async_trait]
impl ByteLink for ScriptedLink {
    async fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> anyhow::Result<usize> {
        {
            let mut shared = lock(&self.shared);
            if take(&mut shared.fail_reads) {
                bail!("serial read failed");
            }
            if !shared.incoming.is_empty() {
                let n = buf.len().min(shared.incoming.len());
                for (slot, byte) in buf.iter_mut().zip(shared.incoming.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
        }
        tokio::time::sleep(timeout).await;
        Ok(0)
    }

    async fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        lock(&self.shared).written.push(line.to_string());
        Ok(())
    }

    async fn close(&mut self) {}
}

// ---------------------------------------------------------------- handlers

/// Everything a handler needs, owned, with probes on the mocks
pub struct Rig {
    pub session: SessionState,
    pub connectivity: ConnectivityManager<MockConnector>,
    pub limiter: PublishLimiter,
    pub storage: MemoryStorage,
    pub indicator: RecordingIndicator,
    pub network: NetworkProbe,
    pub broker: BrokerProbe,
    executor: CommandExecutor,
}

impl Rig {
    pub fn new() -> Self {
        let (network, network_probe) = MockNetwork::new();
        let (connector, broker_probe) = MockConnector::new();
        Self {
            session: SessionState::new(),
            connectivity: ConnectivityManager::new(
                Box::new(network),
                connector,
                "modem-0a0b".into(),
            ),
            limiter: PublishLimiter::new(Duration::from_millis(MIN_PUBLISH_INTERVAL_MS)),
            storage: MemoryStorage::default(),
            indicator: RecordingIndicator::default(),
            network: network_probe,
            broker: broker_probe,
            executor: CommandExecutor::new(),
        }
    }

    /// Credentials and identity stored, nothing connected
    pub fn configured() -> Self {
        let mut rig = Self::new();
        rig.session.set_wifi("home", "secret");
        rig.session.set_identity("maker", "aio_key");
        rig
    }

    /// Configured, with `feeds`, and connected to the broker
    pub async fn online(feeds: &[&str]) -> Self {
        let mut rig = Self::configured();
        rig.session
            .set_feeds(feeds.iter().map(|f| f.to_string()).collect());
        rig.connectivity.connect(&rig.session).await;
        assert!(rig.connectivity.broker_up());
        rig
    }

    /// Dispatch one AT line
    pub async fn execute(&mut self, line: &str) -> CommandOutput {
        let ParsedLine::Command { verb, args } = parse_line(line) else {
            panic!("not a command: {line}");
        };
        let mut ctx = HandlerContext {
            session: &mut self.session,
            connectivity: &mut self.connectivity,
            limiter: &mut self.limiter,
            storage: &self.storage,
            indicator: &mut self.indicator,
        };
        self.executor.execute(&mut ctx, &verb, &args).await
    }

    /// Dispatch one AT line and render the replies
    pub async fn line(&mut self, line: &str) -> Vec<String> {
        self.execute(line)
            .await
            .replies
            .iter()
            .map(|r| r.to_string())
            .collect()
    }
}
