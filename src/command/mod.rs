//! AT command execution
//!
//! This module handles:
//! - Looking up verbs in a fixed table built once at startup
//! - Dispatching to the per-verb handlers
//! - Turning handler failures into a single `ERR:` reply

mod executor;
pub mod handlers;

pub use executor::{CommandExecutor, CommandOutput};
pub use handlers::HandlerContext;
