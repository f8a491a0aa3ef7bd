//! The modem engine: one loop over the controller link
//!
//! Each iteration reads whatever the controller sent within the read
//! timeout, runs every complete line through the parser and dispatcher,
//! then services the broker. Session state, the broker client and the
//! publish gate are owned here and only touched from this loop.

use crate::command::{CommandExecutor, CommandOutput, HandlerContext};
use crate::config::EngineConfig;
use crate::connection::{BrokerConnector, ConnectivityManager};
use crate::device::{Indicator, Storage};
use crate::publish::fanout::publish_data_line;
use crate::publish::PublishLimiter;
use crate::session::SessionState;
use crate::transport::ByteLink;
use aio_modem_shared::{parse_line, LineFramer, ParsedLine, Reply};
use anyhow::Result;
use tracing::{debug, error, info, warn};

/// Bytes requested from the link per read
const READ_CHUNK: usize = 64;

/// What the loop should do after one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// RESET was handled; the session is over
    Reset,
}

pub struct Engine<C: BrokerConnector> {
    config: EngineConfig,
    link: Box<dyn ByteLink>,
    framer: LineFramer,
    executor: CommandExecutor,
    session: SessionState,
    connectivity: ConnectivityManager<C>,
    limiter: PublishLimiter,
    storage: Box<dyn Storage>,
    indicator: Box<dyn Indicator>,
    read_buf: [u8; READ_CHUNK],
}

impl<C: BrokerConnector> Engine<C> {
    /// Create an engine with a fresh session
    pub fn new(
        config: EngineConfig,
        link: Box<dyn ByteLink>,
        connectivity: ConnectivityManager<C>,
        storage: Box<dyn Storage>,
        indicator: Box<dyn Indicator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            limiter: PublishLimiter::new(config.publish_interval),
            config,
            link,
            framer: LineFramer::new(),
            executor: CommandExecutor::new(),
            session: SessionState::new(),
            connectivity,
            storage,
            indicator,
            read_buf: [0; READ_CHUNK],
        })
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[cfg(test)]
    pub fn connectivity(&self) -> &ConnectivityManager<C> {
        &self.connectivity
    }

    /// Run until RESET
    ///
    /// Failures inside an iteration are reported and recovered from; the
    /// loop itself never gives up.
    pub async fn run(&mut self) -> Result<()> {
        info!("[ENGINE] Starting, client id {}", self.connectivity.client_id());
        if let Err(e) = self.emit(&Reply::Banner).await {
            self.recover(e).await;
        }

        loop {
            match self.tick().await {
                Ok(TickOutcome::Continue) => {}
                Ok(TickOutcome::Reset) => {
                    info!("[ENGINE] Restarting");
                    self.shutdown().await;
                    return Ok(());
                }
                Err(e) => self.recover(e).await,
            }
        }
    }

    /// One loop iteration: read, dispatch complete lines, service the broker
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let n = self
            .link
            .read_chunk(&mut self.read_buf, self.config.read_timeout)
            .await?;
        if n > 0 {
            self.framer.extend(&self.read_buf[..n]);
        }

        loop {
            let line = match self.framer.decode_next() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("[ENGINE] Dropped line: {}", e);
                    self.emit(&Reply::err("LINE", "TOO_LONG")).await?;
                    continue;
                }
            };

            let output = self.handle_line(&line).await;
            self.emit_all(&output.replies).await?;
            if output.restart {
                tokio::time::sleep(self.config.reset_delay).await;
                return Ok(TickOutcome::Reset);
            }
        }

        let replies = self
            .connectivity
            .maintain(&self.session, self.config.maintenance_timeout)
            .await;
        self.emit_all(&replies).await?;

        Ok(TickOutcome::Continue)
    }

    /// Route one framed line to the dispatcher or the data publisher
    pub async fn handle_line(&mut self, line: &str) -> CommandOutput {
        debug!("[ENGINE] <- {}", line);
        match parse_line(line) {
            ParsedLine::Command { verb, args } => {
                let mut ctx = HandlerContext {
                    session: &mut self.session,
                    connectivity: &mut self.connectivity,
                    limiter: &mut self.limiter,
                    storage: self.storage.as_ref(),
                    indicator: self.indicator.as_mut(),
                };
                self.executor.execute(&mut ctx, &verb, &args).await
            }
            ParsedLine::Data(text) => CommandOutput::replies(
                publish_data_line(
                    &self.session,
                    &mut self.connectivity,
                    &mut self.limiter,
                    &text,
                )
                .await,
            ),
        }
    }

    async fn emit(&mut self, reply: &Reply) -> Result<()> {
        let line = reply.to_string();
        debug!("[ENGINE] -> {}", line);
        self.link.write_line(&line).await
    }

    async fn emit_all(&mut self, replies: &[Reply]) -> Result<()> {
        for reply in replies {
            self.emit(reply).await?;
        }
        Ok(())
    }

    /// Report, tear connectivity down, pause, resume
    async fn recover(&mut self, failure: anyhow::Error) {
        error!("[ENGINE] Loop failure: {:#}", failure);
        if let Err(e) = self.emit(&Reply::err("MAIN", failure.to_string())).await {
            debug!("[ENGINE] Could not report failure: {}", e);
        }
        self.connectivity.teardown().await;
        tokio::time::sleep(self.config.recovery_pause).await;
    }

    async fn shutdown(&mut self) {
        self.connectivity.teardown().await;
        self.link.close().await;
    }
}
