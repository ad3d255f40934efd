//! Prepare inbound request bodies for the upstream.

use bytes::Bytes;
use serde_json::Value;

use super::tool_names::{is_anthropic_model, normalize_model, transform_request_tool_names};

/// Result of preparing a request body for the upstream.
#[derive(Debug)]
pub struct PreparedRequest {
    /// Body to forward; `None` when the inbound body was empty
    pub body: Option<Bytes>,
    /// Whether tool names were prefixed, i.e. whether the response must be
    /// un-prefixed on the way back
    pub is_anthropic: bool,
}

/// Prepare a raw request body for the upstream.
///
/// 1. Empty bodies are forwarded as no body
/// 2. Bodies that are not JSON are forwarded byte-for-byte
/// 3. The activation flag is computed from the original `model`
/// 4. `anthropic/` is stripped from `model`
/// 5. When active, tool names get the `oc_` prefix
///
/// Never fails: anything unparseable falls through unchanged.
pub fn prepare_request(body: Bytes) -> PreparedRequest {
    if body.is_empty() {
        return PreparedRequest {
            body: None,
            is_anthropic: false,
        };
    }

    let Ok(mut payload) = serde_json::from_slice::<Value>(&body) else {
        return passthrough(body);
    };

    let is_anthropic = payload
        .get("model")
        .and_then(Value::as_str)
        .is_some_and(is_anthropic_model);

    normalize_model(&mut payload);
    if is_anthropic {
        transform_request_tool_names(&mut payload);
    }

    match serde_json::to_vec(&payload) {
        Ok(serialized) => PreparedRequest {
            body: Some(Bytes::from(serialized)),
            is_anthropic,
        },
        Err(_) => passthrough(body),
    }
}

fn passthrough(body: Bytes) -> PreparedRequest {
    PreparedRequest {
        body: Some(body),
        is_anthropic: false,
    }
}
