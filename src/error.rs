//! Error taxonomy for command handling and collaborators

use aio_modem_shared::Reply;
use thiserror::Error;

/// Errors raised by the network driver or broker client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("MISSING_CREDS")]
    MissingCredentials,

    #[error("MISSING_IDENTITY")]
    MissingIdentity,

    #[error("NOT_CONNECTED")]
    NotConnected,

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Broker(String),
}

/// Errors raised by the storage collaborator or record decoding
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record is not an object")]
    NotAnObject,
}

/// Failure of a single command, reported as one `ERR:` line
#[derive(Error, Debug)]
pub enum CommandError {
    /// Wrong argument count or shape
    #[error("ERR:{verb}:ARGS")]
    Argument { verb: &'static str },

    #[error("ERR:AT:UNKNOWN:{0}")]
    UnknownCommand(String),

    /// Feed index outside the feed list
    #[error("ERR:SEND:IDX")]
    Range { index: i64, len: usize },

    /// SEND/PUB/SUB issued while the broker is not up
    #[error("ERR:{verb}:NO_BROKER")]
    NoBroker { verb: &'static str },

    #[error("ERR:FEEDS:EMPTY")]
    NoFeeds,

    #[error("ERR:{context}:{source}")]
    Connectivity {
        context: &'static str,
        #[source]
        source: ConnectivityError,
    },

    #[error("ERR:{context}:{source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    /// Anything else that went wrong inside a handler
    #[error("ERR:AT:{verb}:{detail}")]
    Handler { verb: &'static str, detail: String },
}

impl CommandError {
    /// Convert into the reply line written to the controller
    pub fn into_reply(self) -> Reply {
        let line = self.to_string();
        let body = line.strip_prefix("ERR:").unwrap_or(&line);
        let (context, detail) = body.split_once(':').unwrap_or((body, ""));
        Reply::err(context, detail)
    }
}
