//! Soroban RPC client: polls `getEvents` for the protocol contract and
//! decodes the results into [`ProtocolEvent`]s.
//!
//! Events are requested with `xdrFormat: "json"`, so topics and values arrive
//! as JSON-encoded `ScVal`s (`{"symbol":"funded"}`, `{"map":[...]}`, ...).
//! [`plain`] flattens those into ordinary JSON before fields are read. The
//! older `{"type":…,"value":…}` wrapper and bare strings are accepted too.
//!
//! Transport errors, HTTP 429 and soft RPC errors are retried with
//! exponential back-off capped at [`MAX_BACKOFF_SECS`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, ProtocolEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// JSON-RPC codes that retrying will never fix.
const HARD_ERROR_CODES: [i64; 3] = [-32600, -32601, -32602];

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    #[serde(alias = "topicJson")]
    pub topic: Vec<Value>,
    #[serde(alias = "valueJson")]
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
}

/// One page of `getEvents`.
#[derive(Debug)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Doubling delay between retries.
#[derive(Debug)]
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

/// Fetch a page of contract events.
///
/// Starts at `start_ledger` unless a pagination `cursor` from a previous
/// page is given, in which case the cursor wins.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventPage> {
    let mut backoff = Backoff::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(delay = backoff.secs, "getEvents request failed: {e}");
                backoff.wait().await;
                continue;
            }
        };

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(delay = backoff.secs, "rate-limited by RPC");
            backoff.wait().await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            if HARD_ERROR_CODES.contains(&err.code) {
                return Err(IndexerError::Rpc(format!(
                    "RPC rejected getEvents ({}): {}",
                    err.code, err.message
                )));
            }
            warn!(delay = backoff.secs, code = err.code, "RPC soft error: {}", err.message);
            backoff.wait().await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::Rpc("getEvents returned no result".into()))?;
        debug!(
            count = result.events.len(),
            latest_ledger = ?result.latest_ledger,
            "fetched events"
        );
        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
        "pagination": { "limit": limit },
        "xdrFormat": "json",
    });
    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }
    params
}

/// Decode raw RPC events, skipping ones from failed calls.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<ProtocolEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<ProtocolEvent> {
    let name = plain(raw.topic.first()?);
    let kind = EventKind::from_topic(name.as_str()?);
    let data = plain(&raw.value);

    let second = raw.topic.get(1).map(plain).and_then(|v| scalar(&v));
    let (project_id, topic_actor) = if kind.keyed_by_project() {
        (second, None)
    } else {
        (None, second)
    };

    Some(ProtocolEvent {
        event_type: kind.as_str().to_string(),
        project_id,
        actor: first_scalar(&data, kind.actor_fields()).or(topic_actor),
        amount: first_scalar(&data, kind.amount_fields()),
        status: extract_status(kind, &data),
        ledger: raw.ledger.unwrap_or(0) as i64,
        timestamp: raw
            .ledger_closed_at
            .as_deref()
            .and_then(parse_iso_to_unix)
            .unwrap_or(0),
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Flatten a JSON-encoded `ScVal` into plain JSON.
///
/// Integers of every width become decimal strings so `i128` amounts survive.
fn plain(value: &Value) -> Value {
    match value {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ Value::Object(_)) => plain(&inner),
            _ => Value::String(s.clone()),
        },
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(plain).collect()),
        Value::Object(obj) => {
            if let Some(inner) = obj.get("value").filter(|_| obj.contains_key("type")) {
                return plain(inner);
            }
            if obj.len() == 1 {
                if let Some((tag, inner)) = obj.iter().next() {
                    if let Some(flat) = plain_tagged(tag, inner) {
                        return flat;
                    }
                }
            }
            Value::Object(obj.iter().map(|(k, v)| (k.clone(), plain(v))).collect())
        }
        other => other.clone(),
    }
}

fn plain_tagged(tag: &str, inner: &Value) -> Option<Value> {
    match tag {
        "symbol" | "string" | "address" | "bytes" => Some(plain(inner)),
        "bool" => Some(inner.clone()),
        "u32" | "i32" | "u64" | "i64" | "timepoint" | "duration" => Some(plain(inner)),
        "i128" | "u128" => Some(
            parts_to_decimal(inner)
                .map(Value::String)
                .unwrap_or_else(|| plain(inner)),
        ),
        "vec" => Some(match inner {
            Value::Array(_) => plain(inner),
            _ => Value::Array(Vec::new()),
        }),
        "map" => {
            let entries = inner.as_array()?;
            let mut map = Map::new();
            for entry in entries {
                let key = plain(entry.get("key")?);
                map.insert(key.as_str()?.to_string(), plain(entry.get("val")?));
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

/// `{"hi": …, "lo": …}` halves of a 128-bit integer.
fn parts_to_decimal(parts: &Value) -> Option<String> {
    let hi = parts.get("hi")?.as_i64()?;
    let lo = parts.get("lo")?.as_u64()?;
    Some((((hi as i128) << 64) | lo as i128).to_string())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_scalar(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| data.get(key).and_then(scalar))
}

/// Unit enum variants arrive as a one-element vector of their name.
fn extract_status(kind: EventKind, data: &Value) -> Option<String> {
    let field = if kind == EventKind::StatusChanged { "to" } else { "status" };
    let raw = data.get(field)?;
    match raw {
        Value::Array(items) => items.first().and_then(scalar),
        other => scalar(other),
    }
}

fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}
