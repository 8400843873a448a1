//! Test-only HTTP stub that answers exactly one request with a canned
//! response.

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpListener;

/// Binds an ephemeral local port, serves one HTTP exchange with the given
/// status line and JSON body, and returns the base URL to point a client at.
pub(crate) async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let (mut socket, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(_) => return,
        };
        // Drain the request fully (headers, then any content-length body)
        // before answering, so the client never sees a reset mid-write.
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        let header_end = loop {
            match socket.read(&mut buf).await {
                Ok(0) => return,
                Ok(n) => {
                    request.extend_from_slice(&buf[..n]);
                    if let Some(pos) = find_subsequence(&request, b"\r\n\r\n") {
                        break pos + 4;
                    }
                }
                Err(_) => return,
            }
        };
        let content_length = content_length(&request[..header_end]);
        while request.len() < header_end + content_length {
            match socket.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
                Err(_) => break,
            }
        }
        let response = format!(
            "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}")
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    text.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0)
}
