use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Duration, timeout};

use super::ClientStream;
use valet_http::READ_CHUNK;

pub(crate) enum ReadOutcome {
    Read(usize),
    Timeout,
}

/// One read of up to [`READ_CHUNK`] bytes under a deadline.
pub(crate) async fn read_more(
    stream: &mut dyn ClientStream,
    buf: &mut BytesMut,
    timeout_dur: Duration,
) -> anyhow::Result<ReadOutcome> {
    let mut tmp = [0u8; READ_CHUNK];
    match timeout(timeout_dur, stream.read(&mut tmp)).await {
        Ok(res) => {
            let n = res?;
            if n > 0 {
                buf.extend_from_slice(&tmp[..n]);
            }
            Ok(ReadOutcome::Read(n))
        }
        Err(_) => Ok(ReadOutcome::Timeout),
    }
}

/// Exactly `len` bytes under a deadline; `None` on timeout.
pub(crate) async fn read_exact_timed(
    stream: &mut dyn ClientStream,
    len: usize,
    timeout_dur: Duration,
) -> anyhow::Result<Option<Vec<u8>>> {
    let mut rest = vec![0u8; len];
    match timeout(timeout_dur, stream.read_exact(&mut rest)).await {
        Ok(res) => {
            res?;
            Ok(Some(rest))
        }
        Err(_) => Ok(None),
    }
}

/// Full response write under a deadline; `false` on timeout.
pub(crate) async fn write_all_timed(
    stream: &mut dyn ClientStream,
    bytes: &[u8],
    timeout_dur: Duration,
) -> anyhow::Result<bool> {
    match timeout(timeout_dur, async {
        stream.write_all(bytes).await?;
        stream.flush().await
    })
    .await
    {
        Ok(res) => {
            res?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
