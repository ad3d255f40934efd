//! Tool name transformations.
//!
//! The upstream requires tool names to carry an `oc_` prefix. Requests get the
//! prefix added to every declared tool; responses have it stripped again from
//! every `"name": "oc_<value>"` occurrence in the raw body text.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::constants::{ANTHROPIC_MODEL_PREFIX, CLAUDE_MODEL_PREFIX, TOOL_PREFIX};

/// Longest tail (in bytes) held back while waiting for a possible match to
/// complete. Tool names are far shorter; anything longer is emitted unmatched.
pub const MAX_PENDING_MATCH: usize = 1024;

/// Whether a model name activates tool renaming.
/// Literal, case-sensitive prefix test on the model as sent by the client.
pub fn is_anthropic_model(model: &str) -> bool {
    model.starts_with(ANTHROPIC_MODEL_PREFIX) || model.starts_with(CLAUDE_MODEL_PREFIX)
}

/// Add the `oc_` prefix to a tool name.
pub fn add_oc_prefix(name: &str) -> String {
    format!("{TOOL_PREFIX}{name}")
}

/// Strip `anthropic/` from the `model` field, if present.
/// `claude-` models are left untouched.
pub fn normalize_model(body: &mut Value) {
    let Some(stripped) = body
        .get("model")
        .and_then(Value::as_str)
        .and_then(|m| m.strip_prefix(ANTHROPIC_MODEL_PREFIX))
        .map(str::to_string)
    else {
        return;
    };

    if let Some(obj) = body.as_object_mut() {
        obj.insert("model".to_string(), Value::String(stripped));
    }
}

/// Prefix the names of all declared tools, and of a forced `tool_choice`.
///
/// Only `name` changes; every other field and the order of tools are kept.
/// Tools without a (non-empty) string name are left alone.
pub fn transform_request_tool_names(body: &mut Value) {
    if let Some(tools) = body.get_mut("tools").and_then(Value::as_array_mut) {
        for tool in tools.iter_mut() {
            prefix_name_field(tool);
        }
    }

    if let Some(choice) = body.get_mut("tool_choice")
        && choice.get("type").and_then(Value::as_str) == Some("tool")
    {
        prefix_name_field(choice);
    }
}

fn prefix_name_field(value: &mut Value) {
    if let Some(Value::String(name)) = value.get_mut("name")
        && !name.is_empty()
    {
        *name = add_oc_prefix(name);
    }
}

/// `"name" : "oc_<value>"`, captured around `oc_` so only the prefix is dropped.
static PREFIXED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"("name"\s*:\s*")oc_([^"]+")"#).expect("Invalid prefixed name regex")
});

/// A fragment at the very end of the text that may still grow into a
/// `PREFIXED_NAME` match once more text arrives.
static PARTIAL_PREFIXED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""(?:n(?:a(?:m(?:e(?:"(?:\s*(?::(?:\s*(?:"(?:o(?:c(?:_[^"]*)?)?)?)?)?)?)?)?)?)?)?)?\z"#,
    )
    .expect("Invalid partial name regex")
});

/// Strip the `oc_` prefix from every `"name": "oc_<value>"` in `text`.
///
/// Whitespace around the colon is tolerated and kept as-is; only the three
/// prefix bytes are removed. Returns the rewritten text and the number of
/// input bytes it covers. Unless `at_eof` is set, a trailing partial match is
/// not consumed: the caller keeps `text[consumed..]` and retries it with the
/// next chunk appended.
pub fn strip_prefixed_names(text: &str, at_eof: bool) -> (String, usize) {
    let consumed = if at_eof { text.len() } else { rewritable_len(text) };
    let out = PREFIXED_NAME.replace_all(&text[..consumed], "${1}${2}");
    (out.into_owned(), consumed)
}

/// Length of the prefix of `text` that can be rewritten right away.
fn rewritable_len(text: &str) -> usize {
    // A partial match never starts inside a completed one
    let last_match_end = PREFIXED_NAME.find_iter(text).last().map_or(0, |m| m.end());

    match PARTIAL_PREFIXED_NAME.find_at(text, last_match_end) {
        Some(partial) if partial.len() <= MAX_PENDING_MATCH => partial.start(),
        _ => text.len(),
    }
}
