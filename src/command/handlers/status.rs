//! STATUS / `AT?`: read-only snapshot

use super::HandlerContext;
use crate::command::CommandOutput;
use crate::connection::{BrokerConnector, ConnectivityManager};
use crate::error::CommandError;
use crate::session::SessionState;
use aio_modem_shared::{Reply, StatusSnapshot};

/// Build the snapshot without touching any state
pub fn snapshot<C: BrokerConnector>(
    session: &SessionState,
    connectivity: &ConnectivityManager<C>,
) -> StatusSnapshot {
    StatusSnapshot {
        net_up: connectivity.net_up(),
        address: connectivity.address().map(|a| a.to_string()),
        broker_up: connectivity.broker_up(),
        mode: session.mode(),
        feeds: session.feeds().to_vec(),
    }
}

/// `AT+STATUS` and `AT?`
pub async fn handle_status<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    _args: &[String],
) -> Result<CommandOutput, CommandError> {
    Ok(CommandOutput::reply(Reply::Status(snapshot(
        ctx.session,
        ctx.connectivity,
    ))))
}
