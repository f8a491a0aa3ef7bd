//! Controller link transports
//!
//! The controller is normally wired to a UART; a TCP bridge is supported for
//! bench setups where the serial line is exposed over a socket.

pub mod link;
pub mod serial;
pub mod tcp;
pub mod traits;

pub use link::Link;
pub use serial::{SerialConnector, DEFAULT_BAUD};
pub use tcp::TcpConnector;
pub use traits::ByteLink;
