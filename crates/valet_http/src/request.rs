use std::collections::HashMap;

use crate::error::DecodeError;

/// Size of the initial read issued by the connection handler.
pub const READ_CHUNK: usize = 4096;

/// One parsed HTTP request. Constructed once per connection by the decode
/// step, immutable afterwards, discarded when the connection closes.
#[derive(Debug)]
pub struct Request {
    /// Uppercase as received; never normalized.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Header names lowercased; last write wins on duplicates.
    pub headers: HashMap<String, String>,
    /// Query parameters, values percent-decoded.
    pub query: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Header lookup by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Head parsed from the initial read buffer. The body may still be
/// incomplete; `missing_body_bytes` tells the caller how much one
/// supplemental read must fetch.
#[derive(Debug)]
pub struct ParsedHead {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    /// Offset of the first body byte in the original buffer.
    pub body_start: usize,
    /// Declared Content-Length, 0 when absent or unparseable.
    pub content_length: usize,
}

impl ParsedHead {
    /// Bytes still owed by the client once `buffered` body bytes are in hand.
    pub fn missing_body_bytes(&self, buffered: usize) -> usize {
        self.content_length.saturating_sub(buffered)
    }

    /// Finalize into a [`Request`]. Body length is governed solely by
    /// Content-Length; stray buffered bytes past it are dropped.
    pub fn into_request(self, mut body: Vec<u8>) -> Request {
        body.truncate(self.content_length);
        let body = if self.content_length > 0 { Some(body) } else { None };
        Request {
            method: self.method,
            path: self.path,
            headers: self.headers,
            query: self.query,
            body,
        }
    }
}

/// Parses the request line and headers out of the initial buffer.
///
/// The request line must carry at least `METHOD SP PATH`; headers are every
/// non-empty line before the terminator, split on the literal `": "`.
/// Lines without that separator are ignored rather than rejected.
pub fn parse_head(buf: &[u8]) -> Result<ParsedHead, DecodeError> {
    let head_end = find_head_end(buf).ok_or(DecodeError::UnterminatedHead)?;
    let head = String::from_utf8_lossy(&buf[..head_end]);

    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut tokens = request_line.split_whitespace();
    let (method, target) = match (tokens.next(), tokens.next()) {
        (Some(method), Some(target)) => (method.to_string(), target),
        _ => return Err(DecodeError::NoRequest),
    };

    let (path, query) = match target.split_once('?') {
        Some((path, raw_query)) => (path.to_string(), parse_query(raw_query)),
        None => (target.to_string(), HashMap::new()),
    };

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(": ") else {
            continue;
        };
        headers.insert(name.to_ascii_lowercase(), value.to_string());
    }

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    Ok(ParsedHead {
        method,
        path,
        headers,
        query,
        body_start: head_end + 4,
        content_length,
    })
}

/// Splits a raw query string into percent-decoded key/value pairs.
///
/// Pairs are split on `&`; only pairs containing exactly one `=` are kept.
/// Malformed pairs are dropped silently, never reported as an error, so a
/// partially bad query string cannot abort the whole request.
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in raw.split('&') {
        if pair.matches('=').count() != 1 {
            continue;
        }
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        params.insert(key.to_string(), percent_decode(value));
    }
    params
}

/// Decodes `%XX` escapes and `+` as space. Invalid escapes pass through
/// untouched.
pub fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => match hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                Some(byte) => {
                    out.push(byte);
                    i += 3;
                }
                None => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: Option<u8>, lo: Option<u8>) -> Option<u8> {
    let hi = (hi? as char).to_digit(16)?;
    let lo = (lo? as char).to_digit(16)?;
    Some((hi as u8) << 4 | lo as u8)
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
