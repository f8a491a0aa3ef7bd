//! Board collaborators and their host adapters
//!
//! The firmware talked to a WiFi radio, a flash filesystem, a GPIO LED and
//! the chip's unique id. On a host these become NetworkManager (or an
//! already-online interface), a data directory, a sysfs LED and the
//! machine id.

mod identity;
mod indicator;
mod network;
mod storage;
pub mod traits;

pub use identity::{client_id, StaticId};
pub use indicator::{LogIndicator, SysfsLed};
pub use network::{HostNetwork, NmcliNetwork};
pub use storage::FileStorage;
pub use traits::{Indicator, Storage};
