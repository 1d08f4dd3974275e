//! Line-based refresh trigger.
//!
//! A client sends the shared token on one line; on a match one full refresh
//! runs (actors and groups included) and the outcome is written back as a
//! single line of text.

use std::io;
use std::sync::Arc;

use depute_core::Refresh;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Longest request line read from a client. Anything past it is ignored.
pub const MAX_LINE: u64 = 1024;

/// What the trigger answered one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReply {
    Success,
    Failed,
    InvalidToken,
}

impl TriggerReply {
    pub fn as_line(self) -> &'static str {
        match self {
            TriggerReply::Success => "Update success\n",
            TriggerReply::Failed => "Update failed\n",
            TriggerReply::InvalidToken => "Invalid token.\n",
        }
    }
}

/// Accept clients forever, each on its own task.
///
/// Only returns when the listener itself fails to report its address.
pub async fn serve_trigger<R>(listener: TcpListener, refresher: Arc<R>, token: Arc<str>) -> io::Result<()>
where
    R: Refresh + ?Sized + 'static,
{
    tracing::info!("Update server started on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Could not accept trigger connection: {e}");
                continue;
            }
        };

        let refresher = refresher.clone();
        let token = token.clone();
        tokio::spawn(async move {
            tracing::info!("Connection received from {peer}");
            if let Err(e) = handle_client(stream, refresher.as_ref(), &token).await {
                tracing::warn!("Trigger connection from {peer} failed: {e}");
            }
        });
    }
}

/// Serve one client: read the token line, refresh on a match, reply.
pub async fn handle_client<S, R>(stream: S, refresher: &R, token: &str) -> io::Result<TriggerReply>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Refresh + ?Sized,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut line = String::new();
    BufReader::new(read_half.take(MAX_LINE))
        .read_line(&mut line)
        .await?;

    let reply = if line.trim() == token {
        tracing::info!("Valid token, starting update...");
        if refresher.refresh(true).await.is_success() {
            TriggerReply::Success
        } else {
            TriggerReply::Failed
        }
    } else {
        tracing::warn!("Invalid token received");
        TriggerReply::InvalidToken
    };

    write_half.write_all(reply.as_line().as_bytes()).await?;
    write_half.flush().await?;
    write_half.shutdown().await?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use depute_core::RefreshOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpStream;

    #[derive(Default)]
    struct CountingRefresh {
        calls: AtomicUsize,
        secondary: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Refresh for CountingRefresh {
        async fn refresh(&self, run_secondary: bool) -> RefreshOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if run_secondary {
                self.secondary.fetch_add(1, Ordering::SeqCst);
            }
            if self.fail {
                RefreshOutcome::Failed {
                    reason: "boom".into(),
                }
            } else {
                RefreshOutcome::Success
            }
        }
    }

    async fn exchange(refresher: &CountingRefresh, request: &[u8]) -> (TriggerReply, String) {
        let (mut client, server) = tokio::io::duplex(4096);
        client.write_all(request).await.unwrap();
        let reply = handle_client(server, refresher, "s3cret").await.unwrap();
        let mut text = String::new();
        client.read_to_string(&mut text).await.unwrap();
        (reply, text)
    }

    #[tokio::test]
    async fn correct_token_refreshes_exactly_once() {
        let refresher = CountingRefresh::default();
        let (reply, text) = exchange(&refresher, b"s3cret\n").await;

        assert_eq!(reply, TriggerReply::Success);
        assert_eq!(text, "Update success\n");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(refresher.secondary.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wrong_token_never_refreshes() {
        let refresher = CountingRefresh::default();
        let (reply, text) = exchange(&refresher, b"guess\n").await;

        assert_eq!(reply, TriggerReply::InvalidToken);
        assert_eq!(text, "Invalid token.\n");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_is_reported() {
        let refresher = CountingRefresh {
            fail: true,
            ..Default::default()
        };
        let (reply, text) = exchange(&refresher, b"  s3cret\r\n").await;

        assert_eq!(reply, TriggerReply::Failed);
        assert_eq!(text, "Update failed\n");
    }

    #[tokio::test]
    async fn oversized_line_is_truncated_and_rejected() {
        let refresher = CountingRefresh::default();
        let mut request = b"s3cret".to_vec();
        request.extend(std::iter::repeat(b'x').take(2000));
        request.push(b'\n');

        let (mut client, server) = tokio::io::duplex(8192);
        client.write_all(&request).await.unwrap();
        let reply = handle_client(server, &refresher, "s3cret").await.unwrap();

        assert_eq!(reply, TriggerReply::InvalidToken);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listener_serves_multiple_clients() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let refresher = Arc::new(CountingRefresh::default());
        let server = tokio::spawn(serve_trigger(listener, refresher.clone(), Arc::from("s3cret")));

        for (request, expected) in [
            (&b"nope\n"[..], "Invalid token.\n"),
            (&b"s3cret\n"[..], "Update success\n"),
        ] {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(request).await.unwrap();
            let mut text = String::new();
            stream.read_to_string(&mut text).await.unwrap();
            assert_eq!(text, expected);
        }

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        server.abort();
    }
}
