//! Command executor - looks up verbs and dispatches to handlers

use super::handlers::{self, HandlerContext};
use crate::connection::BrokerConnector;
use crate::error::CommandError;
use aio_modem_shared::Reply;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

/// Every verb the modem understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Bare `AT`
    Ready,
    Wifi,
    Aio,
    Feeds,
    Mode,
    Connect,
    Send,
    Pub,
    Sub,
    Led,
    Status,
    /// `AT?`, same as STATUS
    Query,
    Save,
    Load,
    Reset,
}

impl Verb {
    pub const ALL: [Verb; 15] = [
        Verb::Ready,
        Verb::Wifi,
        Verb::Aio,
        Verb::Feeds,
        Verb::Mode,
        Verb::Connect,
        Verb::Send,
        Verb::Pub,
        Verb::Sub,
        Verb::Led,
        Verb::Status,
        Verb::Query,
        Verb::Save,
        Verb::Load,
        Verb::Reset,
    ];

    /// Wire name, upper case
    pub fn name(self) -> &'static str {
        match self {
            Verb::Ready => "",
            Verb::Wifi => "WIFI",
            Verb::Aio => "AIO",
            Verb::Feeds => "FEEDS",
            Verb::Mode => "MODE",
            Verb::Connect => "CONNECT",
            Verb::Send => "SEND",
            Verb::Pub => "PUB",
            Verb::Sub => "SUB",
            Verb::Led => "LED",
            Verb::Status => "STATUS",
            Verb::Query => "?",
            Verb::Save => "SAVE",
            Verb::Load => "LOAD",
            Verb::Reset => "RESET",
        }
    }
}

/// Replies produced by one command, plus whether the modem must restart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub replies: Vec<Reply>,
    pub restart: bool,
}

impl CommandOutput {
    pub fn reply(reply: Reply) -> Self {
        Self::replies(vec![reply])
    }

    pub fn replies(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            restart: false,
        }
    }

    /// Report and then restart; nothing else runs in this session
    pub fn restart(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            restart: true,
        }
    }
}

/// Executes AT commands against the session
pub struct CommandExecutor {
    verbs: HashMap<&'static str, Verb>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    /// Build the verb table
    pub fn new() -> Self {
        Self {
            verbs: Verb::ALL.iter().map(|v| (v.name(), *v)).collect(),
        }
    }

    /// Case-insensitive verb lookup
    pub fn lookup(&self, verb: &str) -> Option<Verb> {
        self.verbs.get(verb.to_ascii_uppercase().as_str()).copied()
    }

    /// Execute one command; failures become a single `ERR:` reply
    pub async fn execute<C: BrokerConnector>(
        &self,
        ctx: &mut HandlerContext<'_, C>,
        verb_text: &str,
        args: &[String],
    ) -> CommandOutput {
        let Some(verb) = self.lookup(verb_text) else {
            warn!("Unknown command: {:?}", verb_text);
            return CommandOutput::reply(
                CommandError::UnknownCommand(verb_text.to_string()).into_reply(),
            );
        };

        debug!("Executing command: verb={:?} args={}", verb, args.len());

        let result = AssertUnwindSafe(dispatch(ctx, verb, args))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!("Handler for {:?} panicked", verb);
                Err(CommandError::Handler {
                    verb: verb.name(),
                    detail: "internal error".into(),
                })
            });

        match result {
            Ok(output) => output,
            Err(e) => {
                debug!("  Command failed: {}", e);
                CommandOutput::reply(e.into_reply())
            }
        }
    }
}

async fn dispatch<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    verb: Verb,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    match verb {
        Verb::Ready => handlers::handle_ready(ctx, args).await,
        Verb::Wifi => handlers::handle_wifi(ctx, args).await,
        Verb::Aio => handlers::handle_aio(ctx, args).await,
        Verb::Feeds => handlers::handle_feeds(ctx, args).await,
        Verb::Mode => handlers::handle_mode(ctx, args).await,
        Verb::Connect => handlers::handle_connect(ctx, args).await,
        Verb::Send => handlers::handle_send(ctx, args).await,
        Verb::Pub => handlers::handle_pub(ctx, args).await,
        Verb::Sub => handlers::handle_sub(ctx, args).await,
        Verb::Led => handlers::handle_led(ctx, args).await,
        Verb::Status | Verb::Query => handlers::handle_status(ctx, args).await,
        Verb::Save => handlers::handle_save(ctx, args).await,
        Verb::Load => handlers::handle_load(ctx, args).await,
        Verb::Reset => handlers::handle_reset(ctx, args).await,
    }
}
