//! Integration tests for the WebSocket upgrade tunnel.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

mod common;

const UPGRADE_REQUEST: &str = "GET /api/socket HTTP/1.1\r\n\
    Host: 127.0.0.1\r\n\
    Connection: Upgrade\r\n\
    Upgrade: websocket\r\n\
    Sec-WebSocket-Version: 13\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";

#[tokio::test]
async fn websocket_frames_round_trip_through_the_tunnel() {
    let upstream = common::start_ws_echo().await;
    let root = common::static_root();
    let gateway =
        common::start_gateway(root.path().to_path_buf(), &format!("http://{upstream}")).await;

    let ws_url = format!("ws://{}/api/socket", gateway.local_addr());
    let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();

    ws.send(Message::text("hello tunnel")).await.unwrap();
    let echoed = timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(echoed, Message::text("hello tunnel"));

    ws.send(Message::binary(vec![1u8, 2, 3, 250])).await.unwrap();
    let echoed = timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(echoed, Message::binary(vec![1u8, 2, 3, 250]));

    let _ = ws.close(None).await;
    gateway.close();
}

/// WebSocket echo upstream that reports when a connection ends.
async fn ws_echo_with_events() -> (SocketAddr, mpsc::UnboundedReceiver<&'static str>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await {
                    let _ = tx.send("open");
                    while let Some(Ok(message)) = ws.next().await {
                        if message.is_text() || message.is_binary() {
                            if ws.send(message).await.is_err() {
                                break;
                            }
                        } else if message.is_close() {
                            break;
                        }
                    }
                }
                let _ = tx.send("closed");
            });
        }
    });

    (addr, rx)
}

#[tokio::test]
async fn closing_downstream_tears_down_upstream() {
    let (upstream, mut events) = ws_echo_with_events().await;
    let root = common::static_root();
    let gateway =
        common::start_gateway(root.path().to_path_buf(), &format!("http://{upstream}")).await;

    let mut stream = TcpStream::connect(gateway.local_addr()).await.unwrap();
    stream.write_all(UPGRADE_REQUEST.as_bytes()).await.unwrap();

    // Wait for the upstream handshake to complete before dropping.
    let opened = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert_eq!(opened, Some("open"));

    drop(stream);

    let closed = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert_eq!(closed, Some("closed"));

    gateway.close();
}

#[tokio::test]
async fn upgrade_without_api_base_gets_raw_500() {
    let root = common::static_root();
    let gateway = common::start_gateway(root.path().to_path_buf(), "").await;

    let mut stream = TcpStream::connect(gateway.local_addr()).await.unwrap();
    stream.write_all(UPGRADE_REQUEST.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let _ = timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap();
    let response = String::from_utf8_lossy(&response);

    assert!(
        response.starts_with("HTTP/1.1 500"),
        "got: {response}"
    );

    gateway.close();
}

#[tokio::test]
async fn upgrade_to_unreachable_upstream_closes_downstream() {
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let root = common::static_root();
    let gateway =
        common::start_gateway(root.path().to_path_buf(), &format!("http://{dead_addr}")).await;

    let mut stream = TcpStream::connect(gateway.local_addr()).await.unwrap();
    stream.write_all(UPGRADE_REQUEST.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let read = timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;

    // The socket is destroyed without a handshake; nothing is written back.
    assert!(matches!(read, Ok(Ok(0))), "expected a bare close");

    gateway.close();
}

#[tokio::test]
async fn upgrades_outside_the_prefix_are_not_tunneled() {
    let upstream = common::start_ws_echo().await;
    let root = common::static_root();
    let gateway =
        common::start_gateway(root.path().to_path_buf(), &format!("http://{upstream}")).await;

    let ws_url = format!("ws://{}/live", gateway.local_addr());
    let result = tokio_tungstenite::connect_async(ws_url).await;

    assert!(result.is_err(), "upgrade outside /api must not reach the backend");

    gateway.close();
}
