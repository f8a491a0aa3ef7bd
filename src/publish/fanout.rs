//! Publish fan-out: CSV bursts, indexed feeds and raw topics

use super::limiter::PublishLimiter;
use crate::connection::{BrokerConnector, ConnectivityManager};
use crate::error::CommandError;
use crate::session::SessionState;
use aio_modem_shared::{Mode, Reply};
use tracing::debug;

/// How a SEND argument list is interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendPlan<'a> {
    /// Positional values mapped onto the feed list
    Burst(&'a [String]),
    /// `index,value`
    Indexed { index: &'a str, value: &'a str },
}

/// Classify SEND arguments
///
/// One token, or all tokens decimal numbers, is a CSV burst; anything else
/// is `index,value`. So `1,2` is always a burst, never index 1 value 2.
pub fn classify_send(tokens: &[String]) -> SendPlan<'_> {
    if tokens.len() == 1 || tokens.iter().all(|t| is_decimal(t)) {
        return SendPlan::Burst(tokens);
    }
    SendPlan::Indexed {
        index: &tokens[0],
        value: &tokens[1],
    }
}

/// A number once one `.` is dropped and leading `-` signs are stripped
///
/// `-12`, `3.5`, `.5`, `7.` and `--1` count; `1e3`, `1.2.3` and `-` do not.
pub fn is_decimal(token: &str) -> bool {
    let without_dot = token.replacen('.', "", 1);
    let digits = without_dot.trim_start_matches('-');
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Publish positional values to the feed list under one gate decision
///
/// Values past the end of the feed list are discarded.
pub async fn publish_burst<C: BrokerConnector>(
    session: &SessionState,
    connectivity: &mut ConnectivityManager<C>,
    limiter: &mut PublishLimiter,
    values: &[String],
) -> Result<Vec<Reply>, CommandError> {
    if session.feeds().is_empty() {
        return Err(CommandError::NoFeeds);
    }
    if !limiter.try_acquire() {
        debug!("[PUBLISH] Burst of {} dropped by rate gate", values.len());
        return Ok(Vec::new());
    }

    let mut replies = Vec::with_capacity(values.len());
    for (feed, value) in session.feeds().iter().zip(values) {
        let topic = session.feed_topic(feed);
        match connectivity.publish(&topic, value).await {
            Ok(()) => replies.push(Reply::Ack {
                feed: feed.clone(),
                value: value.clone(),
            }),
            Err(e) => replies.push(Reply::err("PUB", format!("{feed}:{e}"))),
        }
    }
    Ok(replies)
}

/// Publish one value to the feed at `index`
pub async fn publish_index<C: BrokerConnector>(
    session: &SessionState,
    connectivity: &mut ConnectivityManager<C>,
    limiter: &mut PublishLimiter,
    index: usize,
    value: &str,
) -> Result<Vec<Reply>, CommandError> {
    let feed = session.feed(index).ok_or(CommandError::Range {
        index: index as i64,
        len: session.feeds().len(),
    })?;
    if !limiter.try_acquire() {
        debug!("[PUBLISH] {} dropped by rate gate", feed);
        return Ok(Vec::new());
    }

    connectivity
        .publish(&session.feed_topic(feed), value)
        .await
        .map_err(|source| CommandError::Connectivity {
            context: "SEND",
            source,
        })?;

    Ok(vec![Reply::Ack {
        feed: feed.to_string(),
        value: value.to_string(),
    }])
}

/// Publish to an explicit topic, bypassing the feed list
pub async fn publish_topic<C: BrokerConnector>(
    connectivity: &mut ConnectivityManager<C>,
    limiter: &mut PublishLimiter,
    topic: &str,
    payload: &str,
) -> Result<Vec<Reply>, CommandError> {
    if !limiter.try_acquire() {
        debug!("[PUBLISH] {} dropped by rate gate", topic);
        return Ok(Vec::new());
    }

    connectivity
        .publish(topic, payload)
        .await
        .map_err(|source| CommandError::Connectivity {
            context: "PUB",
            source,
        })?;

    Ok(vec![Reply::ok("PUB")])
}

/// Publish a non-command line according to the session mode
///
/// Lines are ignored while the broker is down.
pub async fn publish_data_line<C: BrokerConnector>(
    session: &SessionState,
    connectivity: &mut ConnectivityManager<C>,
    limiter: &mut PublishLimiter,
    line: &str,
) -> Vec<Reply> {
    if !connectivity.broker_up() {
        debug!("[PUBLISH] Broker down, ignoring data line");
        return Vec::new();
    }

    let result = match session.mode() {
        Mode::Csv => {
            let values: Vec<String> = line
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            publish_burst(session, connectivity, limiter, &values).await
        }
        Mode::Raw => match line.split_once(' ') {
            Some((topic, payload)) => publish_topic(connectivity, limiter, topic, payload).await,
            None => Ok(vec![Reply::err("RAW", "FORMAT")]),
        },
    };

    result.unwrap_or_else(|e| vec![e.into_reply()])
}
