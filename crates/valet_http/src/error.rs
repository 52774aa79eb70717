use thiserror::Error;

/// Reasons the decoder can reject an initial read buffer.
///
/// Both variants end the connection silently; garbage input never gets a
/// response.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Request line had fewer than two space-separated tokens.
    #[error("no request")]
    NoRequest,
    /// The header section was never terminated by an empty line.
    #[error("missing header terminator")]
    UnterminatedHead,
}
