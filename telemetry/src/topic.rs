//! Inbound message decoding.
//!
//! Two feeds reach the ingest task as text:
//!
//! - the duplex feed, carrying full snapshots (`{"robots": {...}}`) and
//!   control replies (`{"type": "pong"}`);
//! - the topic relay, carrying `{"topic": "robot/battery", "payload": "87.2"}`
//!   envelopes.
//!
//! Both decode into [`Inbound`]. Topics this dashboard does not track decode
//! to [`Inbound::Ignored`] rather than an error, so an unfamiliar topic never
//! looks like a fault.

#[cfg(test)]
#[path = "topic_test.rs"]
mod topic_test;

use serde::Deserialize;
use serde_json::Value;

use crate::model::{Position, Sensors, Snapshot};

/// Error returned by [`decode_message`] and [`decode_topic`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("topic {topic}: expected a number, got {payload:?}")]
    InvalidNumber { topic: String, payload: String },
    #[error("message is neither a snapshot, a topic envelope nor a control reply")]
    UnknownShape,
}

/// A single-field telemetry delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Speed(f64),
    Battery(f64),
    Temperature(f64),
    Position(Position),
    Sensors(Sensors),
}

/// A decoded per-topic delta.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicUpdate {
    /// Robot named in the topic, or `None` for the default robot.
    pub robot: Option<String>,
    pub metric: Metric,
}

/// Result of decoding one inbound text message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Snapshot(Snapshot),
    Topic(TopicUpdate),
    /// Well-formed but not relevant to the store.
    Ignored,
}

#[derive(Deserialize)]
struct Envelope {
    topic: String,
    #[serde(default)]
    payload: Value,
}

/// Decode one text message from either feed.
///
/// # Errors
///
/// Returns [`DecodeError`] for invalid JSON, a malformed snapshot or topic
/// payload, or an object of unrecognised shape.
pub fn decode_message(text: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = &value else {
        return Err(DecodeError::UnknownShape);
    };

    if map.contains_key("topic") {
        let envelope: Envelope = serde_json::from_value(value)?;
        let payload = match envelope.payload {
            Value::String(raw) => raw,
            other => other.to_string(),
        };
        return Ok(decode_topic(&envelope.topic, &payload)?.map_or(Inbound::Ignored, Inbound::Topic));
    }
    if map.contains_key("robots") {
        return Ok(Inbound::Snapshot(serde_json::from_value(value)?));
    }
    if map.contains_key("type") {
        return Ok(Inbound::Ignored);
    }
    Err(DecodeError::UnknownShape)
}

/// Decode a pub/sub topic and its raw payload.
///
/// `robot/<metric>` addresses the default robot and `robot/<id>/<metric>`
/// a named one. Returns `Ok(None)` for topics the store does not track.
///
/// # Errors
///
/// Returns [`DecodeError`] when a tracked topic carries an unparsable payload.
pub fn decode_topic(topic: &str, payload: &str) -> Result<Option<TopicUpdate>, DecodeError> {
    let parts: Vec<&str> = topic.split('/').collect();
    let (robot, name) = match parts.as_slice() {
        ["robot", name] => (None, *name),
        ["robot", id, name] if !id.is_empty() => (Some((*id).to_owned()), *name),
        _ => return Ok(None),
    };

    let metric = match name {
        "speed" => Metric::Speed(parse_number(topic, payload)?),
        "battery" => Metric::Battery(parse_number(topic, payload)?),
        "temperature" => Metric::Temperature(parse_number(topic, payload)?),
        "position" => Metric::Position(serde_json::from_str(payload)?),
        "sensors" => Metric::Sensors(serde_json::from_str(payload)?),
        _ => return Ok(None),
    };
    Ok(Some(TopicUpdate { robot, metric }))
}

fn parse_number(topic: &str, payload: &str) -> Result<f64, DecodeError> {
    payload
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::InvalidNumber { topic: topic.to_owned(), payload: payload.to_owned() })
}
