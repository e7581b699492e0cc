use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{context::RequestEnvelope, error::AppError, options::merge_options};

/// The body that will be sent upstream and whether the caller asked for a
/// streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBody {
    pub bytes: Bytes,
    pub stream: bool,
}

#[derive(Deserialize)]
struct StreamFlag {
    #[serde(default)]
    stream: Option<Value>,
}

/// Rewrites generate/chat bodies and passes every other body through as-is.
pub fn prepare_body(envelope: &RequestEnvelope, raw: Bytes) -> Result<PreparedBody, AppError> {
    if !envelope.carries_body() {
        return Ok(PreparedBody {
            bytes: Bytes::new(),
            stream: false,
        });
    }

    if !envelope.is_generation() {
        let stream = requests_streaming(&raw, envelope.streams_by_default());
        return Ok(PreparedBody { bytes: raw, stream });
    }

    let mut body = parse_object(&raw)?;
    let stream = augment(&mut body);
    debug!(path = %envelope.path, stream, "Injected default options");

    Ok(PreparedBody {
        bytes: Bytes::from(serde_json::to_vec(&Value::Object(body))?),
        stream,
    })
}

/// Forces `stream:false` unless the caller sent exactly `true`, then merges
/// the default options under the caller's. Returns the effective stream flag.
pub fn augment(body: &mut Map<String, Value>) -> bool {
    let stream = matches!(body.get("stream"), Some(Value::Bool(true)));
    if !stream {
        body.insert("stream".to_string(), Value::Bool(false));
    }

    let options = merge_options(body.get("options"));
    body.insert("options".to_string(), Value::Object(options));
    stream
}

fn parse_object(raw: &[u8]) -> Result<Map<String, Value>, AppError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::NotAnObject),
    }
}

/// An explicit boolean wins; an absent or null flag falls back to the
/// route's default.
fn requests_streaming(raw: &[u8], default: bool) -> bool {
    match serde_json::from_slice::<StreamFlag>(raw) {
        Ok(StreamFlag {
            stream: Some(Value::Bool(b)),
        }) => b,
        Ok(StreamFlag {
            stream: None | Some(Value::Null),
        }) => default,
        _ => false,
    }
}
