//! Reply lines written back to the controller
//!
//! Every event produces exactly one line:
//! ```text
//! OK:<context>[:detail]
//! ERR:<context>:<detail>
//! STATUS:NET:<YES|NO>:<addr> BROKER:<YES|NO> MODE:<mode> FEEDS:[a,b]
//! RXMQTT:<topic>:<payload>
//! ACK:<feed>:<value>
//! MODEM:READY (AT? for status)
//! ```

use std::fmt;

use crate::{limits, Mode};

/// Read-only connectivity and session snapshot reported by STATUS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub net_up: bool,
    pub address: Option<String>,
    pub broker_up: bool,
    pub mode: Mode,
    pub feeds: Vec<String>,
}

/// A single output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok {
        context: String,
        detail: Option<String>,
    },
    Err {
        context: String,
        detail: String,
    },
    Status(StatusSnapshot),
    /// Message received on a subscribed topic
    Inbound { topic: String, payload: String },
    /// A value published to a feed
    Ack { feed: String, value: String },
    Banner,
}

impl Reply {
    /// `OK:<context>`
    pub fn ok(context: impl Into<String>) -> Self {
        Reply::Ok {
            context: context.into(),
            detail: None,
        }
    }

    /// `OK:<context>:<detail>`
    pub fn ok_with(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Reply::Ok {
            context: context.into(),
            detail: Some(detail.into()),
        }
    }

    /// `ERR:<context>:<detail>`
    pub fn err(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Reply::Err {
            context: context.into(),
            detail: detail.into(),
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Reply::Err { .. })
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok {
                context,
                detail: None,
            } => write!(f, "OK:{context}"),
            Reply::Ok {
                context,
                detail: Some(detail),
            } => write!(f, "OK:{context}:{detail}"),
            Reply::Err { context, detail } => write!(f, "ERR:{context}:{detail}"),
            Reply::Status(status) => write!(
                f,
                "STATUS:NET:{}:{} BROKER:{} MODE:{} FEEDS:[{}]",
                yes_no(status.net_up),
                status.address.as_deref().unwrap_or("none"),
                yes_no(status.broker_up),
                status.mode,
                status.feeds.join(","),
            ),
            Reply::Inbound { topic, payload } => write!(f, "RXMQTT:{topic}:{payload}"),
            Reply::Ack { feed, value } => write!(f, "ACK:{feed}:{value}"),
            Reply::Banner => f.write_str(limits::BOOT_BANNER),
        }
    }
}
