//! Session persistence
//!
//! Records are JSON with the layout:
//! ```text
//! { "wifi": {"ssid", "pwd"}, "aio": {"user", "key"}, "feeds": [...], "mode": "CSV" }
//! ```
//!
//! Loading is lenient: a `wifi` or `aio` entry that is missing or not an
//! object leaves the current pair in place. An object with a null or missing
//! field clears the pair.

use super::state::SessionState;
use crate::device::Storage;
use crate::error::StorageError;
use aio_modem_shared::{limits::CONFIG_RECORD, Mode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

#[derive(Serialize)]
struct WifiRecord<'a> {
    ssid: Option<&'a str>,
    pwd: Option<&'a str>,
}

#[derive(Serialize)]
struct AioRecord<'a> {
    user: Option<&'a str>,
    key: Option<&'a str>,
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    wifi: WifiRecord<'a>,
    aio: AioRecord<'a>,
    feeds: &'a [String],
    mode: String,
}

/// Serialize the full session
pub fn encode(state: &SessionState) -> Result<Vec<u8>, StorageError> {
    let wifi = state.wifi();
    let identity = state.identity();

    let record = SessionRecord {
        wifi: WifiRecord {
            ssid: wifi.map(|w| w.ssid.as_str()),
            pwd: wifi.map(|w| w.password.as_str()),
        },
        aio: AioRecord {
            user: identity.map(|id| id.user.as_str()),
            key: identity.map(|id| id.key.as_str()),
        },
        feeds: state.feeds(),
        mode: state.mode().to_string(),
    };

    Ok(serde_json::to_vec(&record)?)
}

/// Apply a stored record on top of the current session
pub fn apply(state: &mut SessionState, bytes: &[u8]) -> Result<(), StorageError> {
    let raw: Value = serde_json::from_slice(bytes)?;
    let Value::Object(raw) = raw else {
        return Err(StorageError::NotAnObject);
    };

    match string_pair(&raw, "wifi", "ssid", "pwd") {
        Some(Some((ssid, pwd))) => state.set_wifi(ssid, pwd),
        Some(None) => state.clear_wifi(),
        None => {}
    }
    match string_pair(&raw, "aio", "user", "key") {
        Some(Some((user, key))) => state.set_identity(user, key),
        Some(None) => state.clear_identity(),
        None => {}
    }

    state.set_feeds(feed_list(raw.get("feeds")));
    state.set_mode(normalize_mode(raw.get("mode")));

    Ok(())
}

/// Restore the session from storage
pub async fn load(storage: &dyn Storage, state: &mut SessionState) -> Result<(), StorageError> {
    let bytes = storage.read(CONFIG_RECORD).await?;
    apply(state, &bytes)?;
    info!(
        "[CONFIG] Loaded {} feeds, mode {}",
        state.feeds().len(),
        state.mode()
    );
    Ok(())
}

/// Write the session to storage
pub async fn save(storage: &dyn Storage, state: &SessionState) -> Result<(), StorageError> {
    let bytes = encode(state)?;
    storage.write(CONFIG_RECORD, &bytes).await?;
    debug!("[CONFIG] Saved {} bytes", bytes.len());
    Ok(())
}

/// `None` when `object` is absent or not an object, `Some(None)` when either
/// field is not a string
fn string_pair(
    raw: &Map<String, Value>,
    object: &str,
    first: &str,
    second: &str,
) -> Option<Option<(String, String)>> {
    let sub = raw.get(object)?.as_object()?;
    let field = |name: &str| sub.get(name).and_then(Value::as_str).map(String::from);
    Some(field(first).zip(field(second)))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn feed_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(scalar) if is_truthy(scalar) => scalar_text(scalar).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn normalize_mode(value: Option<&Value>) -> Mode {
    let text = match value {
        None => return Mode::Csv,
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if text.eq_ignore_ascii_case("CSV") {
        Mode::Csv
    } else {
        Mode::Raw
    }
}
