//! Command handlers, one module per command family

mod config;
mod connect;
mod device;
mod publish;
mod settings;
mod status;

pub use config::{handle_load, handle_save};
pub use connect::handle_connect;
pub use device::{handle_led, handle_ready, handle_reset};
pub use publish::{handle_pub, handle_send, handle_sub};
pub use settings::{handle_aio, handle_feeds, handle_mode, handle_wifi};
pub use status::handle_status;

use crate::connection::{BrokerConnector, ConnectivityManager};
use crate::device::{Indicator, Storage};
use crate::publish::PublishLimiter;
use crate::session::SessionState;

/// Everything a handler may touch, borrowed from the engine for one command
pub struct HandlerContext<'a, C: BrokerConnector> {
    pub session: &'a mut SessionState,
    pub connectivity: &'a mut ConnectivityManager<C>,
    pub limiter: &'a mut PublishLimiter,
    pub storage: &'a dyn Storage,
    pub indicator: &'a mut dyn Indicator,
}
