//! SEND, PUB and SUB: everything that needs a live broker

use super::HandlerContext;
use crate::command::CommandOutput;
use crate::connection::BrokerConnector;
use crate::error::CommandError;
use crate::publish::fanout::{publish_burst, publish_index, publish_topic};
use crate::publish::{classify_send, SendPlan};
use aio_modem_shared::Reply;
use tracing::info;

fn require_broker<C: BrokerConnector>(
    ctx: &HandlerContext<'_, C>,
    verb: &'static str,
) -> Result<(), CommandError> {
    if ctx.connectivity.broker_up() {
        Ok(())
    } else {
        Err(CommandError::NoBroker { verb })
    }
}

/// `AT+SEND=v1,v2,..` (burst) or `AT+SEND=index,value`
pub async fn handle_send<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    require_broker(ctx, "SEND")?;
    if args.is_empty() {
        return Err(CommandError::Argument { verb: "SEND" });
    }

    let mut replies = match classify_send(args) {
        SendPlan::Burst(values) => {
            publish_burst(ctx.session, ctx.connectivity, ctx.limiter, values).await?
        }
        SendPlan::Indexed { index, value } => {
            let index: i64 = index
                .parse()
                .map_err(|_| CommandError::Argument { verb: "SEND" })?;
            let index = usize::try_from(index).map_err(|_| CommandError::Range {
                index,
                len: ctx.session.feeds().len(),
            })?;
            publish_index(ctx.session, ctx.connectivity, ctx.limiter, index, value).await?
        }
    };

    replies.push(Reply::ok("SEND"));
    Ok(CommandOutput::replies(replies))
}

/// `AT+PUB=topic,payload`
pub async fn handle_pub<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    require_broker(ctx, "PUB")?;
    let [topic, payload, ..] = args else {
        return Err(CommandError::Argument { verb: "PUB" });
    };

    let replies = publish_topic(ctx.connectivity, ctx.limiter, topic, payload).await?;
    Ok(CommandOutput::replies(replies))
}

/// `AT+SUB=topic`
pub async fn handle_sub<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    require_broker(ctx, "SUB")?;
    let [topic, ..] = args else {
        return Err(CommandError::Argument { verb: "SUB" });
    };

    ctx.connectivity
        .subscribe(topic)
        .await
        .map_err(|source| CommandError::Connectivity {
            context: "SUB",
            source,
        })?;
    info!("[BROKER] Subscribed to {}", topic);
    Ok(CommandOutput::reply(Reply::ok("SUB")))
}
