use bytes::BytesMut;
use tokio::time::Duration;
use tracing::{debug, warn};
use valet_http::{parse_head, Request, READ_CHUNK};

use super::timeouts::{read_exact_timed, read_more, ReadOutcome};
use super::ClientStream;

/// Reads one HTTP request off the connection.
///
/// A single initial read supplies the head and whatever body bytes arrived
/// with it. When Content-Length outruns that buffer, exactly one
/// supplemental exact-size read fetches the remainder. Bodies that need
/// more than two reads total are out of contract for this decoder.
///
/// `Ok(None)` means the connection should close silently: nothing arrived,
/// the deadline passed, or the bytes were not a parseable request.
pub(crate) async fn read_http_request(
    stream: &mut dyn ClientStream,
    read_timeout: Duration,
) -> anyhow::Result<Option<Request>> {
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    match read_more(stream, &mut buf, read_timeout).await? {
        ReadOutcome::Timeout => {
            debug!(target: "valet::http", "Read deadline passed before any bytes arrived");
            return Ok(None);
        }
        ReadOutcome::Read(0) => return Ok(None),
        ReadOutcome::Read(_) => {}
    }

    let head = match parse_head(&buf) {
        Ok(head) => head,
        Err(err) => {
            debug!(
                target: "valet::http",
                error = %err,
                "Discarding unparseable request"
            );
            return Ok(None);
        }
    };

    debug!(
        target: "valet::http",
        method = %head.method,
        path = %head.path,
        content_length = head.content_length,
        "Parsed request head"
    );

    let mut body = buf[head.body_start.min(buf.len())..].to_vec();
    let missing = head.missing_body_bytes(body.len());
    if missing > 0 {
        match read_exact_timed(stream, missing, read_timeout).await? {
            Some(rest) => body.extend_from_slice(&rest),
            None => {
                warn!(
                    target: "valet::http",
                    missing,
                    "Body continuation read timed out"
                );
                return Ok(None);
            }
        }
    }

    Ok(Some(head.into_request(body)))
}
