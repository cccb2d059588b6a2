//! Transport-neutral request and response types.
//!
//! The transport converts each inbound HTTP request into a [`SourceRequest`]
//! and writes the returned [`SourceResponse`] back to the client. Handlers and
//! the dispatcher never see transport-specific types.

use std::collections::HashMap;

/// A fully buffered inbound HTTP request.
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
    method: String,
    path: String,
    query: Option<String>,
    /// Decoded by the transport; repeated keys are kept.
    query_pairs: Vec<(String, String)>,
    /// Header names are stored lower-cased.
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl SourceRequest {
    /// Creates a request with the given method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Sets the raw query string (without the leading `?`).
    ///
    /// The raw string is informational; handlers read
    /// [`query_pairs`](Self::query_pairs).
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Appends one decoded query parameter.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_pairs.push((name.into(), value.into()));
        self
    }

    /// Adds a header. The name is lower-cased.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns a header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns all headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns the body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the `charset` parameter of the `Content-Type` header, if declared.
    pub fn character_encoding(&self) -> Option<&str> {
        let content_type = self.header("content-type")?;
        content_type.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("charset") {
                let value = value.trim().trim_matches('"');
                (!value.is_empty()).then_some(value)
            } else {
                None
            }
        })
    }

    /// Returns the decoded query parameters in request order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query_pairs
    }

    /// Returns the first value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// The response the dispatcher hands back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    status: u16,
    body: String,
    charset: Option<String>,
}

impl SourceResponse {
    /// A `200 OK` response with an empty body.
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: String::new(),
            charset: None,
        }
    }

    /// An error response with the given status and message.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: message.into(),
            charset: None,
        }
    }

    /// Sets the character encoding advertised in the `Content-Type` header.
    pub fn with_charset(mut self, charset: Option<&str>) -> Self {
        self.charset = charset.map(str::to_string);
        self
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the advertised character encoding.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = SourceRequest::new("POST", "/").with_header("X-Custom", "v");
        assert_eq!(req.header("x-custom"), Some("v"));
        assert_eq!(req.header("X-CUSTOM"), Some("v"));
    }

    #[test]
    fn test_character_encoding() {
        let req = SourceRequest::new("POST", "/")
            .with_header("Content-Type", "application/json; charset=\"UTF-8\"");
        assert_eq!(req.character_encoding(), Some("UTF-8"));

        let req = SourceRequest::new("POST", "/").with_header("Content-Type", "application/json");
        assert_eq!(req.character_encoding(), None);

        let req = SourceRequest::new("POST", "/");
        assert_eq!(req.character_encoding(), None);
    }

    #[test]
    fn test_query_params_keep_order_and_repeats() {
        let req = SourceRequest::new("GET", "/")
            .with_query("file=a&file=b&kind=raw")
            .with_query_param("file", "a")
            .with_query_param("file", "b")
            .with_query_param("kind", "raw");

        assert_eq!(req.query(), Some("file=a&file=b&kind=raw"));
        assert_eq!(req.query_pairs().len(), 3);
        assert_eq!(req.query_param("file"), Some("a"));
        assert_eq!(req.query_param("kind"), Some("raw"));
        assert_eq!(req.query_param("missing"), None);
    }
}
