//! CONNECT: network association followed by the broker session

use super::HandlerContext;
use crate::command::CommandOutput;
use crate::connection::BrokerConnector;
use crate::error::CommandError;

/// `AT+CONNECT`
///
/// Failures are part of the output rather than an `Err`: a network failure
/// reports only `ERR:NET:..`, a broker failure follows `OK:NET:..`.
pub async fn handle_connect<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    _args: &[String],
) -> Result<CommandOutput, CommandError> {
    let replies = ctx.connectivity.connect(ctx.session).await;
    Ok(CommandOutput::replies(replies))
}
