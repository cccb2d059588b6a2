//! Events and event batches.

use std::collections::BTreeMap;

/// An immutable unit of data: an opaque payload plus string headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Event {
    /// Creates an event from headers and a payload.
    pub fn new(headers: BTreeMap<String, String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Creates an event with no headers.
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(BTreeMap::new(), body)
    }

    /// Returns the event headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns a single header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Returns the raw payload.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the payload as UTF-8 text, if it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Consumes the event, returning its parts.
    pub fn into_parts(self) -> (BTreeMap<String, String>, Vec<u8>) {
        (self.headers, self.body)
    }
}

/// The ordered events decoded from exactly one request.
pub type EventBatch = Vec<Event>;
