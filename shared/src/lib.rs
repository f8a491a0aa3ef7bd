//! AIO Modem Shared Protocol Types
//!
//! This crate provides the pure, I/O-free pieces of the modem protocol:
//! line framing over a chunked byte stream, the AT command grammar, the
//! reply vocabulary written back to the controller, and the connectivity
//! state machine.

pub mod codec;
pub mod command;
pub mod reply;
pub mod state_machine;

pub use codec::{FrameError, LineFramer};
pub use command::{parse_args, parse_line, ParsedLine};
pub use reply::{Reply, StatusSnapshot};
pub use state_machine::{ConnectivityEvent, ConnectivityState, ConnectivityStateMachine};

use strum::{Display, EnumString};

/// Protocol limits shared by the framer and the engine
pub mod limits {
    /// Maximum raw length of one line, in bytes
    pub const MAX_LINE_LEN: usize = 256;

    /// Minimum spacing between two allowed publishes, in milliseconds
    pub const MIN_PUBLISH_INTERVAL_MS: u64 = 1500;

    /// Name of the persisted session record
    pub const CONFIG_RECORD: &str = "modem_config.json";

    /// Boot banner written once the engine is ready
    pub const BOOT_BANNER: &str = "MODEM:READY (AT? for status)";
}

/// How non-command lines are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Mode {
    /// Comma separated values mapped onto the feed list
    #[default]
    Csv,
    /// `topic payload` pairs published verbatim
    Raw,
}
