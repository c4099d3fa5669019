//! Minimal HTTP/1.1 stub server for exercising download and query paths in
//! tests. Each accepted connection serves exactly one canned response and
//! closes, so every request arrives on a fresh connection in order.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One canned action per accepted connection, in order.
pub(crate) enum StubResponse {
    /// Well-formed response with a matching Content-Length.
    Body {
        status: u16,
        reason: &'static str,
        body: Vec<u8>,
    },
    /// 302 redirect to the given location.
    Redirect { location: String },
    /// Declares `claimed_len` but sends only `body` before dropping the
    /// connection, which the client sees as a transport error mid-stream.
    Truncated { claimed_len: usize, body: Vec<u8> },
}

pub(crate) struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub(crate) fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Request lines ("GET /path HTTP/1.1") seen so far, in arrival order.
    pub(crate) fn request_lines(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) async fn spawn_stub_server(responses: Vec<StubResponse>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };

            // Read the request head; bodies (if any) are ignored.
            let mut head = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }

            let request_line = String::from_utf8_lossy(&head)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            seen.lock().unwrap().push(request_line);

            let payload = match &response {
                StubResponse::Body {
                    status,
                    reason,
                    body,
                } => {
                    let mut p = format!(
                        "HTTP/1.1 {} {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        status,
                        reason,
                        body.len()
                    )
                    .into_bytes();
                    p.extend_from_slice(body);
                    p
                }
                StubResponse::Redirect { location } => format!(
                    "HTTP/1.1 302 Found\r\nlocation: {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    location
                )
                .into_bytes(),
                StubResponse::Truncated { claimed_len, body } => {
                    let mut p = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        claimed_len
                    )
                    .into_bytes();
                    p.extend_from_slice(body);
                    p
                }
            };

            let _ = socket.write_all(&payload).await;
            let _ = socket.flush().await;
            // Dropping the socket closes the connection; for Truncated this
            // happens before the declared length has been served.
        }
    });

    StubServer { addr, requests }
}
