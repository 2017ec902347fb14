//! Docker Engine API payloads and request paths

use chrono::{DateTime, TimeZone, Utc};
use housekeep_domain::{ContainerInfo, DeletedItem, Event, EventQuery, TransportError};
use serde::Deserialize;

/// One line of `GET /events`
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "Type", default)]
    kind: String,

    #[serde(rename = "Action", default)]
    action: Option<String>,

    /// Pre-1.22 name of `Action`
    #[serde(default)]
    status: Option<String>,

    /// Deprecated alias of `Actor.ID`, still sent by most engines
    #[serde(default)]
    id: Option<String>,

    #[serde(rename = "Actor", default)]
    actor: Option<RawActor>,

    #[serde(default)]
    time: i64,

    #[serde(rename = "timeNano", default)]
    time_nano: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    #[serde(rename = "ID", default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawContainer {
    #[serde(rename = "Id")]
    id: String,

    #[serde(rename = "Image")]
    image: String,
}

#[derive(Debug, Deserialize)]
struct RawDeleteItem {
    #[serde(rename = "Untagged", default)]
    untagged: Option<String>,

    #[serde(rename = "Deleted", default)]
    deleted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    message: String,
}

pub(crate) fn decode_event(line: &str) -> Result<Event, TransportError> {
    let raw: RawEvent = serde_json::from_str(line)
        .map_err(|e| TransportError::Decode(format!("event {line:?}: {e}")))?;

    let time = event_time(raw.time, raw.time_nano)
        .ok_or_else(|| TransportError::Decode(format!("event time out of range: {}", raw.time)))?;

    let subject_id = raw
        .id
        .filter(|id| !id.is_empty())
        .or_else(|| raw.actor.map(|actor| actor.id))
        .unwrap_or_default();

    Ok(Event {
        kind: raw.kind,
        action: raw.action.or(raw.status).unwrap_or_default(),
        subject_id,
        time,
    })
}

fn event_time(secs: i64, nanos: Option<i64>) -> Option<DateTime<Utc>> {
    match nanos {
        Some(nanos) if nanos > 0 => Some(Utc.timestamp_nanos(nanos)),
        _ => Utc.timestamp_opt(secs, 0).single(),
    }
}

pub(crate) fn decode_container(body: &[u8]) -> Result<ContainerInfo, TransportError> {
    let raw: RawContainer = serde_json::from_slice(body)
        .map_err(|e| TransportError::Decode(format!("container inspect: {e}")))?;
    Ok(ContainerInfo {
        id: raw.id,
        image: raw.image,
    })
}

pub(crate) fn decode_delete(body: &[u8]) -> Result<Vec<DeletedItem>, TransportError> {
    let items: Vec<RawDeleteItem> = serde_json::from_slice(body)
        .map_err(|e| TransportError::Decode(format!("image delete: {e}")))?;

    Ok(items
        .into_iter()
        .flat_map(|item| {
            item.untagged
                .map(DeletedItem::Untagged)
                .into_iter()
                .chain(item.deleted.map(DeletedItem::Deleted))
        })
        .collect())
}

/// Engine error message from a failed response, or the raw body
pub(crate) fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<RawErrorBody>(body) {
        Ok(err) => err.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

pub(crate) fn events_path(query: &EventQuery) -> String {
    let mut params = Vec::new();

    if let Some(since) = query.since {
        params.push(format!("since={}", since.timestamp()));
    }
    if let Some(until) = query.until {
        params.push(format!("until={}", until.timestamp()));
    }
    if !query.filters.is_empty() {
        // HashMap<String, Vec<String>> always serializes
        let filters = serde_json::to_string(&query.filters).unwrap_or_default();
        params.push(format!("filters={}", urlencoding::encode(&filters)));
    }

    if params.is_empty() {
        "/events".to_string()
    } else {
        format!("/events?{}", params.join("&"))
    }
}
