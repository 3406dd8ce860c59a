use std::net::SocketAddr;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader},
    net::TcpListener,
    sync::oneshot,
};
use travel_log_lib::SourceEvent;

use crate::tracking::ChannelSource;

/// Accepts device connections that stream newline separated JSON source
/// events. The bound address is sent on `ready` once, before the first accept.
pub async fn listen(
    addr: SocketAddr,
    source: ChannelSource,
    ready: oneshot::Sender<SocketAddr>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await.inspect_err(|err| {
        tracing::error!("Failed to bind device feed on {addr}: {err}");
    })?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Device feed listening on {}", local_addr);

    if ready.send(local_addr).is_err() {
        tracing::warn!("Nobody is waiting for the device feed");
    }

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(connection) => connection,
            Err(err) => {
                tracing::error!("Failed to accept connection: {err}");
                continue;
            },
        };

        tracing::info!("New device connection from {}", addr);

        let source = source.clone();
        tokio::spawn(async move {
            let res = handle_connection(stream, &source).await;
            tracing::info!("Connection from {} ended with result: {:?}", addr, res);
        });
    }
}

/// Longest event line accepted from a device, newline excluded.
const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Returns the number of events forwarded. Lines that are not a JSON source
/// event, including non UTF-8 and overlong ones, are skipped.
pub async fn handle_connection<S: AsyncRead + Unpin>(stream: S, source: &ChannelSource) -> Result<usize, anyhow::Error> {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut forwarded = 0;

    loop {
        buf.clear();
        let read = (&mut reader).take(MAX_LINE_BYTES + 1).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            break;
        }
        if !buf.ends_with(b"\n") && read as u64 > MAX_LINE_BYTES {
            tracing::warn!("Skipping event longer than {} bytes", MAX_LINE_BYTES);
            discard_line(&mut reader).await?;
            continue;
        }

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let event: SourceEvent = match serde_json::from_slice(line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("Skipping malformed event: {err}");
                continue;
            },
        };

        if source.publish(event).await {
            forwarded += 1;
        }
    }

    Ok(forwarded)
}

/// Drops input up to and including the next newline.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|byte| *byte == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        if done {
            return Ok(());
        }
    }
}
