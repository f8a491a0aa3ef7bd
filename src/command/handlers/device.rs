//! LED, RESET and the bare `AT` readiness check

use super::HandlerContext;
use crate::command::CommandOutput;
use crate::connection::BrokerConnector;
use crate::error::CommandError;
use aio_modem_shared::Reply;
use tracing::{info, warn};

/// Bare `AT`
pub async fn handle_ready<C: BrokerConnector>(
    _ctx: &mut HandlerContext<'_, C>,
    _args: &[String],
) -> Result<CommandOutput, CommandError> {
    Ok(CommandOutput::reply(Reply::ok("READY")))
}

/// `AT+LED=ON|OFF`
pub async fn handle_led<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    args: &[String],
) -> Result<CommandOutput, CommandError> {
    let on = match args.first().map(|a| a.to_ascii_uppercase()).as_deref() {
        Some("ON") => true,
        Some("OFF") => false,
        _ => return Err(CommandError::Argument { verb: "LED" }),
    };

    ctx.indicator.set(on).map_err(|e| {
        warn!("[LED] Indicator failed: {:#}", e);
        CommandError::Handler {
            verb: "LED",
            detail: e.to_string(),
        }
    })?;

    Ok(CommandOutput::reply(Reply::ok_with(
        "LED",
        if on { "ON" } else { "OFF" },
    )))
}

/// `AT+RESET`: report, then the engine restarts from a fresh boot
pub async fn handle_reset<C: BrokerConnector>(
    _ctx: &mut HandlerContext<'_, C>,
    _args: &[String],
) -> Result<CommandOutput, CommandError> {
    info!("[ENGINE] Reset requested");
    Ok(CommandOutput::restart(Reply::ok("RESET")))
}

#[cfg(test)]
mod tests {
    use crate::testing::Rig;

    #[tokio::test]
    async fn test_bare_at_is_ready() {
        let mut rig = Rig::new();
        assert_eq!(rig.line("AT").await, vec!["OK:READY"]);
        assert_eq!(rig.line("at+").await, vec!["OK:READY"]);
    }

    #[tokio::test]
    async fn test_led_toggles_indicator() {
        let mut rig = Rig::new();
        assert_eq!(rig.line("AT+LED=on").await, vec!["OK:LED:ON"]);
        assert_eq!(rig.line("AT+LED=OFF").await, vec!["OK:LED:OFF"]);
        assert_eq!(rig.indicator.history(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_led_rejects_other_values() {
        let mut rig = Rig::new();
        assert_eq!(rig.line("AT+LED=blink").await, vec!["ERR:LED:ARGS"]);
        assert_eq!(rig.line("AT+LED").await, vec!["ERR:LED:ARGS"]);
        assert!(rig.indicator.history().is_empty());
    }

    #[tokio::test]
    async fn test_led_failure_is_a_command_error() {
        let mut rig = Rig::new();
        rig.indicator.fail_next();
        assert_eq!(rig.line("AT+LED=ON").await, vec!["ERR:AT:LED:gpio busy"]);
    }

    #[tokio::test]
    async fn test_reset_requests_restart() {
        let mut rig = Rig::new();
        let out = rig.execute("AT+RESET").await;
        assert!(out.restart);
        assert_eq!(out.replies.len(), 1);
        assert_eq!(out.replies[0].to_string(), "OK:RESET");
    }
}
