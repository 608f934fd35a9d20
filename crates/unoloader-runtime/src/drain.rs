//! Background draining of a child's side-channel output.
//!
//! A child that writes more to stderr than the pipe buffer holds blocks until
//! someone reads it. The drain reads and discards everything until the stream
//! closes, so the caller can concentrate on stdout.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Spawn a detached task that discards `stream` until end of stream.
///
/// The task returns nothing and is never awaited; it ends when the child
/// closes the stream (normally when it exits). Read errors end it quietly.
pub fn spawn_drain(stream: impl AsyncRead + Unpin + Send + 'static, label: &'static str) {
    tokio::spawn(async move {
        let mut stream = stream;
        let mut scratch = [0u8; 4096];
        let mut discarded: usize = 0;

        loop {
            match stream.read(&mut scratch).await {
                Ok(0) => break, // EOF
                Ok(n) => discarded += n,
                Err(e) => {
                    debug!(%label, error = %e, "drain exiting due to read error");
                    break;
                }
            }
        }

        debug!(%label, discarded, "drain task exiting");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn drain_consumes_more_than_pipe_capacity() {
        let (mut writer, reader) = tokio::io::duplex(64);
        spawn_drain(reader, "test");

        // Writing far beyond the duplex buffer only completes if the drain reads.
        let payload = vec![b'x'; 256 * 1024];
        tokio::time::timeout(Duration::from_secs(5), writer.write_all(&payload))
            .await
            .expect("drain did not keep up")
            .unwrap();
    }
}
