//! Wire codec for the embedded HTTP/1.1 server.
//!
//! Parses raw bytes into a [`Request`] and serializes a [`Response`] back
//! into bytes. This crate performs no network I/O; the connection handler
//! owns the socket and feeds buffers in.

pub mod error;
pub mod request;
pub mod response;

pub use error::DecodeError;
pub use request::{parse_head, parse_query, percent_decode, ParsedHead, Request, READ_CHUNK};
pub use response::{reason_phrase, Response};
