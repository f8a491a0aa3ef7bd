//! SAVE and LOAD: session persistence

use super::HandlerContext;
use crate::command::CommandOutput;
use crate::connection::BrokerConnector;
use crate::error::CommandError;
use crate::session::persist;
use aio_modem_shared::Reply;
use tracing::warn;

/// `AT+SAVE`
pub async fn handle_save<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    _args: &[String],
) -> Result<CommandOutput, CommandError> {
    persist::save(ctx.storage, ctx.session)
        .await
        .map_err(|source| {
            warn!("[CONFIG] Save failed: {}", source);
            CommandError::Storage {
                context: "SAVE",
                source,
            }
        })?;
    Ok(CommandOutput::reply(Reply::ok("SAVED")))
}

/// `AT+LOAD`; on failure the session is left as it was
pub async fn handle_load<C: BrokerConnector>(
    ctx: &mut HandlerContext<'_, C>,
    _args: &[String],
) -> Result<CommandOutput, CommandError> {
    persist::load(ctx.storage, ctx.session)
        .await
        .map_err(|source| {
            warn!("[CONFIG] Load failed: {}", source);
            CommandError::Storage {
                context: "LOAD",
                source,
            }
        })?;
    Ok(CommandOutput::reply(Reply::ok("LOADED")))
}

#[cfg(test)]
mod tests {
    use crate::session::SessionState;
    use crate::testing::Rig;
    use aio_modem_shared::Mode;

    #[tokio::test]
    async fn test_save_then_load_after_changes() {
        let mut rig = Rig::new();
        rig.line("AT+WIFI=home,secret").await;
        rig.line("AT+FEEDS=temp,hum").await;
        rig.line("AT+MODE=RAW").await;
        assert_eq!(rig.line("AT+SAVE").await, vec!["OK:SAVED"]);
        let saved = rig.session.clone();

        rig.line("AT+FEEDS=other").await;
        rig.line("AT+MODE=CSV").await;
        assert_eq!(rig.line("AT+LOAD").await, vec!["OK:LOADED"]);
        assert_eq!(rig.session, saved);
        assert_eq!(rig.session.mode(), Mode::Raw);
    }

    #[tokio::test]
    async fn test_load_clears_credentials_saved_as_absent() {
        let mut rig = Rig::new();
        rig.line("AT+FEEDS=a").await;
        assert_eq!(rig.line("AT+SAVE").await, vec!["OK:SAVED"]);
        let saved = rig.session.clone();

        rig.line("AT+WIFI=x,y").await;
        rig.line("AT+AIO=u,k").await;
        assert_eq!(rig.line("AT+LOAD").await, vec!["OK:LOADED"]);
        assert_eq!(rig.session, saved);
        assert!(rig.session.wifi().is_none());
        assert!(rig.session.identity().is_none());
    }

    #[tokio::test]
    async fn test_load_without_record_reports_error() {
        let mut rig = Rig::new();
        rig.line("AT+FEEDS=a").await;
        let out = rig.line("AT+LOAD").await;

        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("ERR:LOAD:"), "{}", out[0]);
        assert_eq!(rig.session.feeds(), ["a".to_string()]);
    }

    #[tokio::test]
    async fn test_load_rejects_non_object() {
        let mut rig = Rig::new();
        rig.storage.put("modem_config.json", b"\"just a string\"");
        let out = rig.line("AT+LOAD").await;
        assert_eq!(out, vec!["ERR:LOAD:record is not an object"]);
        assert_eq!(rig.session, SessionState::new());
    }

    #[tokio::test]
    async fn test_save_failure_reports_error() {
        let mut rig = Rig::new();
        rig.storage.fail_writes();
        let out = rig.line("AT+SAVE").await;
        assert!(out[0].starts_with("ERR:SAVE:"), "{}", out[0]);
    }
}
