//! Rate-limited publishing
//!
//! Every publish path (SEND, PUB and non-command data lines) goes through a
//! single [`PublishLimiter`]. Refused publishes are dropped without a reply.

pub mod fanout;
mod limiter;

pub use fanout::{classify_send, SendPlan};
pub use limiter::PublishLimiter;
