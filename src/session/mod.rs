//! The command session: credentials, feed list, publish mode and their
//! persistence.

pub mod persist;
mod state;

pub use state::{ServiceIdentity, SessionState, WifiCredentials};
