// ABOUTME: The JSON error envelope `{error, detail?}` returned to the browser on every failure.
// ABOUTME: Also reshapes backend error bodies (DRF-style `detail`/`error`/`message`) into that envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest non-JSON backend body echoed back as `detail`.
const MAX_TEXT_DETAIL: usize = 512;

/// Keys checked, in order, for a human-readable backend message.
const MESSAGE_KEYS: &[&str] = &["error", "detail", "message"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Reshape a failed backend response body.
    ///
    /// The message is the first string under `error`, `detail` or `message`.
    /// Whatever else the body carries (field validation errors, a second
    /// message) is kept as `detail`. Non-JSON bodies become a truncated text
    /// detail under a generic message.
    pub fn from_backend(status: u16, body: &[u8]) -> Self {
        let fallback = format!("Backend request failed with status {status}");

        let parsed: Option<Value> = if body.is_empty() {
            None
        } else {
            serde_json::from_slice(body).ok()
        };

        match parsed {
            Some(Value::Object(mut map)) => {
                let message_key = MESSAGE_KEYS
                    .iter()
                    .find(|k| map.get(**k).is_some_and(Value::is_string))
                    .copied();
                let Some(key) = message_key else {
                    // Validation errors: `{"email": ["already taken"]}`.
                    return if map.is_empty() {
                        Self::new(fallback)
                    } else {
                        Self::new(fallback).with_detail(Value::Object(map))
                    };
                };
                let error = match map.remove(key) {
                    Some(Value::String(s)) => s,
                    _ => fallback,
                };
                let detail = if map.len() == 1 && map.contains_key("detail") {
                    map.remove("detail")
                } else if map.is_empty() {
                    None
                } else {
                    Some(Value::Object(map))
                };
                Self { error, detail }
            }
            Some(Value::String(s)) if !s.is_empty() => Self::new(s),
            Some(Value::String(_)) | Some(Value::Null) => Self::new(fallback),
            Some(other) => Self::new(fallback).with_detail(other),
            None => {
                let text = String::from_utf8_lossy(body);
                let text = text.trim();
                if text.is_empty() {
                    Self::new(fallback)
                } else {
                    Self::new(fallback).with_detail(truncate(text, MAX_TEXT_DETAIL))
                }
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
