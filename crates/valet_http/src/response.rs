use std::collections::HashMap;
use std::time::SystemTime;

use serde_json::{json, Value};

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &str = "\r\n";
const HEADER_CONTENT_LENGTH: &str = "Content-Length";
const HEADER_CONTENT_TYPE: &str = "Content-Type";
const HEADER_DATE: &str = "Date";
const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";

/// One outgoing HTTP response. Constructed by a handler or by the
/// auth/routing layer, consumed exactly once by [`Response::encode`].
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// JSON response from a structured body.
    pub fn json(status: u16, value: &Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self::new(status)
            .header(HEADER_CONTENT_TYPE, APPLICATION_JSON)
            .with_body(body)
    }

    /// JSON response from an already-serialized payload (cache hits).
    pub fn raw_json(status: u16, body: String) -> Self {
        Self::new(status)
            .header(HEADER_CONTENT_TYPE, APPLICATION_JSON)
            .with_body(body.into_bytes())
    }

    pub fn html(status: u16, document: String) -> Self {
        Self::new(status)
            .header(HEADER_CONTENT_TYPE, TEXT_HTML_UTF8)
            .with_body(document.into_bytes())
    }

    /// Structured error body: `{"error": message}`.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Body as UTF-8, when present and valid.
    pub fn body_utf8(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Serializes status line, headers and body into wire bytes.
    ///
    /// Header emission order is unspecified. `Content-Length` is injected
    /// when a body exists and none was set explicitly; `Date` likewise.
    pub fn encode(&self) -> Vec<u8> {
        let body_len = self.body.as_ref().map(Vec::len).unwrap_or(0);
        let mut head = String::with_capacity(128 + self.headers.len() * 32);

        head.push_str(HTTP_VERSION);
        head.push(' ');
        head.push_str(&self.status.to_string());
        head.push(' ');
        head.push_str(reason_phrase(self.status));
        head.push_str(CRLF);

        for (name, value) in &self.headers {
            write_header(&mut head, name, value);
        }
        if self.body.is_some() && !self.has_header(HEADER_CONTENT_LENGTH) {
            write_header(&mut head, HEADER_CONTENT_LENGTH, &body_len.to_string());
        }
        if !self.has_header(HEADER_DATE) {
            write_header(&mut head, HEADER_DATE, &httpdate::fmt_http_date(SystemTime::now()));
        }
        head.push_str(CRLF);

        let mut out = head.into_bytes();
        if let Some(body) = &self.body {
            out.extend_from_slice(body);
        }
        out
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
    }
}

fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

/// Fixed reason-phrase table; anything unlisted maps to "Unknown".
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
