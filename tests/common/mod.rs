//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use minechat_gateway::{ConfigProvider, GatewayConfig, GatewayHandle, GatewayServer, RuntimeConfig};

/// Start a gateway on an ephemeral port serving `root`, with a fixed
/// backend configuration. Empty `api_base` means "unconfigured".
pub async fn start_gateway(root: PathBuf, api_base: &str) -> GatewayHandle {
    let api_base = api_base.to_string();
    let provider: ConfigProvider = Arc::new(move || RuntimeConfig {
        api_base: api_base.clone(),
        api_proxy_base: String::new(),
    });

    let config = GatewayConfig {
        static_root: root,
        host: "127.0.0.1".to_string(),
        port: 0,
    };

    let server = GatewayServer::bind(config, provider).await.unwrap();
    server.start()
}

/// Create a static root with a few representative assets.
pub fn static_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>home</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('app');").unwrap();
    std::fs::create_dir(dir.path().join("img")).unwrap();
    std::fs::write(dir.path().join("img/logo.svg"), "<svg/>").unwrap();
    dir
}

/// Start a mock backend that captures each raw request head and replies
/// with a fixed response carrying `extra_headers` (CRLF-terminated lines).
#[allow(dead_code)]
pub async fn start_recording_backend(
    extra_headers: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => {
                            buf.extend_from_slice(&chunk[..n]);
                            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());

                let body = "upstream-ok";
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                    body.len(),
                    extra_headers,
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Start a WebSocket echo server; text and binary frames bounce straight
/// back.
#[allow(dead_code)]
pub async fn start_ws_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                use futures_util::{SinkExt, StreamExt};
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    if message.is_text() || message.is_binary() {
                        if ws.send(message).await.is_err() {
                            break;
                        }
                    } else if message.is_close() {
                        break;
                    }
                }
            });
        }
    });

    addr
}
