//! JSON array handler.
//!
//! Expects the request body to be a JSON array of objects:
//!
//! ```json
//! [
//!   {"headers": {"a": "b"}, "body": "hello"},
//!   {"body": "world"}
//! ]
//! ```
//!
//! Each element becomes one [`Event`] in array order. `headers` may be omitted;
//! `body` is required. A request is accepted or rejected as a whole: if any
//! element fails to match the schema no events are produced.

use std::collections::BTreeMap;

use serde::Deserialize;
use spout_core::prelude::*;
use spout_macros::register_handler;
use tracing::trace;

/// Registry identifier of [`JsonHandler`].
pub const JSON_HANDLER: &str = "json";

/// Character sets the handler accepts when the request declares one.
const SUPPORTED_CHARSETS: [&str; 3] = ["utf-8", "utf8", "us-ascii"];

/// Wire shape of one array element.
#[derive(Debug, Deserialize)]
struct JsonEvent {
    #[serde(default)]
    headers: BTreeMap<String, String>,
    body: String,
}

/// Decodes a JSON array of `{headers, body}` objects into events.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonHandler;

impl JsonHandler {
    /// Creates a new handler.
    pub fn new() -> Self {
        Self
    }
}

impl SourceHandler for JsonHandler {
    fn get_events(&self, request: &SourceRequest) -> HandlerResult<EventBatch> {
        if let Some(charset) = request.character_encoding()
            && !SUPPORTED_CHARSETS
                .iter()
                .any(|c| c.eq_ignore_ascii_case(charset))
        {
            return Err(HandlerError::decode(format!(
                "unsupported character set in request: {charset}; the JSON handler only accepts UTF-8"
            )));
        }

        let body = request
            .body()
            .strip_prefix(b"\xEF\xBB\xBF")
            .unwrap_or(request.body());

        let elements: Vec<JsonEvent> = serde_json::from_slice(body).map_err(|e| {
            HandlerError::decode(format!("request body is not a valid event array: {e}"))
        })?;

        trace!(events = elements.len(), "Decoded JSON event array");

        Ok(elements
            .into_iter()
            .map(|e| Event::new(e.headers, e.body))
            .collect())
    }
}

#[register_handler(json)]
pub(crate) fn json_handler() -> JsonHandler {
    JsonHandler::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: &str) -> SourceRequest {
        SourceRequest::new("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    #[test]
    fn test_single_event() {
        let events = JsonHandler
            .get_events(&post(r#"[{"headers":{"a":"b"},"body":"hello"}]"#))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].header("a"), Some("b"));
        assert_eq!(events[0].body(), b"hello");
    }

    #[test]
    fn test_preserves_order_and_defaults_headers() {
        let events = JsonHandler
            .get_events(&post(
                r#"[{"body":"1"},{"headers":{"k":"v"},"body":"2"},{"body":"3","extra":true}]"#,
            ))
            .unwrap();

        let bodies: Vec<_> = events.iter().map(|e| e.body_str().unwrap()).collect();
        assert_eq!(bodies, ["1", "2", "3"]);
        assert!(events[0].headers().is_empty());
    }

    #[test]
    fn test_empty_array() {
        let events = JsonHandler.get_events(&post("[]")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_not_json_is_decode_error() {
        let err = JsonHandler.get_events(&post("not json")).unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));
    }

    #[test]
    fn test_non_array_root_is_decode_error() {
        let err = JsonHandler
            .get_events(&post(r#"{"headers":{},"body":"x"}"#))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));
    }

    #[test]
    fn test_one_bad_element_rejects_whole_request() {
        let err = JsonHandler
            .get_events(&post(r#"[{"body":"ok"},{"headers":{"a":1},"body":"bad"}]"#))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));

        let err = JsonHandler
            .get_events(&post(r#"[{"body":"ok"},{"headers":{}}]"#))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));
    }

    #[test]
    fn test_charset_handling() {
        let utf8 = SourceRequest::new("POST", "/")
            .with_header("content-type", "application/json; charset=UTF-8")
            .with_body(r#"[{"body":"x"}]"#);
        assert_eq!(JsonHandler.get_events(&utf8).unwrap().len(), 1);

        let latin1 = SourceRequest::new("POST", "/")
            .with_header("content-type", "application/json; charset=ISO-8859-1")
            .with_body(r#"[{"body":"x"}]"#);
        assert!(matches!(
            JsonHandler.get_events(&latin1),
            Err(HandlerError::Decode(_))
        ));
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let mut body = b"\xEF\xBB\xBF".to_vec();
        body.extend_from_slice(br#"[{"body":"bom"}]"#);
        let req = SourceRequest::new("POST", "/").with_body(body);
        assert_eq!(JsonHandler.get_events(&req).unwrap()[0].body(), b"bom");
    }

    #[test]
    fn test_registered_as_json() {
        let handler = spout_core::resolve_handler(JSON_HANDLER).unwrap();
        assert_eq!(handler.get_events(&post("[]")).unwrap().len(), 0);
    }
}
