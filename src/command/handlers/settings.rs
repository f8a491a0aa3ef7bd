//! WIFI, AIO, FEEDS and MODE: session settings, no side effects

use super::HandlerContext;
use crate::command::CommandOutput;
use crate::connection::BrokerConnector;
use crate::error::CommandError;
use aio_modem_shared::{Mode, Reply};
use tracing::info;

/// `AT+WIFI=ssid,password`
pub async fn handle_wifi<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    let [ssid, password, ..] = args else {
        return Err(CommandError::Argument { verb: "WIFI" });
    };

    info!("[SESSION] WiFi credentials set for {:?}", ssid);
    ctx.session.set_wifi(ssid.as_str(), password.as_str());
    Ok(CommandOutput::reply(Reply::ok_with("WIFI", "SET")))
}

/// `AT+AIO=user,key`
pub async fn handle_aio<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    let [user, key, ..] = args else {
        return Err(CommandError::Argument { verb: "AIO" });
    };

    info!("[SESSION] Service identity set for {:?}", user);
    ctx.session.set_identity(user.as_str(), key.as_str());
    Ok(CommandOutput::reply(Reply::ok_with("AIO", "SET")))
}

/// `AT+FEEDS=a,b,c` replaces the whole list; no arguments clears it
pub async fn handle_feeds<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    info!("[SESSION] Feeds: {:?}", args);
    ctx.session.set_feeds(args.to_vec());
    Ok(CommandOutput::reply(Reply::ok_with("FEEDS", "SET")))
}

/// `AT+MODE=CSV|RAW`; always answers with the mode now in effect
///
/// A missing or unrecognised mode leaves the current one.
pub async fn handle_mode<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    if let Some(mode) = args.first().and_then(|m| m.parse::<Mode>().ok()) {
        ctx.session.set_mode(mode);
    }
    Ok(CommandOutput::reply(Reply::ok_with(
        "MODE",
        ctx.session.mode().to_string(),
    )))
}
