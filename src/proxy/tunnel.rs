//! Raw WebSocket upgrade tunnel for the reserved `/api` namespace.
//!
//! # Responsibilities
//! - Parse the sniffed request head and detect protocol upgrades
//! - Dial the backend over TCP, with TLS + SNI for secure targets
//! - Replay the upgrade handshake line-by-line on the fresh connection
//! - Splice bytes bidirectionally until either side goes away
//!
//! # Design Decisions
//! - The handshake is reconstructed as text and written to a raw socket
//!   instead of going through an HTTP client: client abstractions do not
//!   expose upgrade-socket takeover, and the backend's `101` must flow to
//!   the client byte-for-byte through the splice
//! - Bytes that arrived after the head (early frames) are forwarded to the
//!   upstream right behind the replayed handshake

use std::io;

use tokio::io::{copy_bidirectional, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::net::tls;
use crate::net::CONNECT_TIMEOUT;
use crate::proxy::target;

/// Upper bound on a sniffed request head.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Status line written straight to the socket when no backend is
/// configured; at this point the connection carries no HTTP framing layer
/// that could produce a structured body.
const RAW_UNCONFIGURED: &[u8] = b"HTTP/1.1 500 Internal Server Error\r\n\r\n";

/// Parsed head of an inbound HTTP/1.1 request, as sniffed off the socket.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub uri: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Parse a request head (request line plus header lines). Returns
    /// `None` for anything that is not plausibly HTTP/1.x; such
    /// connections fall through to the regular HTTP layer.
    pub fn parse(head: &str) -> Option<RequestHead> {
        let mut lines = head.split("\r\n");

        let request_line = lines.next()?;
        let mut pieces = request_line.split(' ');
        let method = pieces.next()?.to_string();
        let uri = pieces.next()?.to_string();
        let version = pieces.next()?.to_string();
        if method.is_empty() || uri.is_empty() || !version.starts_with("HTTP/") {
            return None;
        }

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line.split_once(':')?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Some(RequestHead {
            method,
            uri,
            version,
            headers,
        })
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn path(&self) -> &str {
        self.uri.split('?').next().unwrap_or(&self.uri)
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    /// True for requests negotiating a protocol switch: `Connection` must
    /// name `upgrade` and an `Upgrade` header must be present.
    pub fn is_upgrade(&self) -> bool {
        let connection_upgrades = self
            .header("connection")
            .map(|value| {
                value
                    .split(',')
                    .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
            })
            .unwrap_or(false);
        connection_upgrades && self.header("upgrade").is_some()
    }
}

/// Whether a sniffed head should be tunneled instead of dispatched.
pub fn wants_tunnel(head: &RequestHead) -> bool {
    head.is_upgrade() && target::is_proxy_path(head.path())
}

/// Read the request head (through the blank line) off a fresh connection
/// into `buf`. Returns the offset just past the head, or `None` when the
/// peer closes first or the head exceeds the cap; in both cases the bytes
/// read so far remain in `buf` for the caller to replay.
pub async fn read_head<S>(stream: &mut S, buf: &mut Vec<u8>) -> io::Result<Option<usize>>
where
    S: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(end) = head_end(buf) {
            return Ok(Some(end));
        }
        if buf.len() >= MAX_HEAD_BYTES {
            return Ok(None);
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// Serialize the handshake to replay upstream: the original request line
/// with the prefix-stripped path, every header verbatim except `Host`,
/// which is rewritten to the upstream authority.
fn serialize_handshake(head: &RequestHead, target_url: &Url, authority: &str) -> Vec<u8> {
    let mut path = target_url.path().to_string();
    if let Some(query) = target_url.query() {
        path.push('?');
        path.push_str(query);
    }

    let mut out = Vec::with_capacity(512);
    out.extend_from_slice(format!("{} {} {}\r\n", head.method, path, head.version).as_bytes());
    for (name, value) in &head.headers {
        if name.eq_ignore_ascii_case("host") {
            out.extend_from_slice(format!("Host: {authority}\r\n").as_bytes());
        } else {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
    }
    out.extend_from_slice(b"\r\n");
    out
}

/// Tunnel one accepted upgrade through to the backend.
///
/// Owns both sockets for the session's lifetime. Any failure before the
/// handshake is replayed destroys the downstream socket; after that, the
/// splice runs until either side closes or errors, then both sides are
/// shut down.
pub async fn run(
    mut downstream: TcpStream,
    head: RequestHead,
    early_data: Vec<u8>,
    runtime: RuntimeConfig,
) {
    let session = Uuid::new_v4();

    let Some(api_base) = runtime.api_base() else {
        tracing::warn!(%session, "upgrade rejected: api base not configured");
        let _ = downstream.write_all(RAW_UNCONFIGURED).await;
        let _ = downstream.shutdown().await;
        return;
    };

    let target_url = match target::build_target(api_base, head.path(), head.query()) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(%session, error = %err, "upgrade rejected: invalid target");
            return;
        }
    };
    let Some(host) = target_url.host_str().map(str::to_owned) else {
        tracing::warn!(%session, upstream = %target_url, "upgrade rejected: target has no host");
        return;
    };
    let port = target::connect_port(&target_url);
    let authority = target::authority(&target_url);

    tracing::debug!(%session, upstream = %target_url, "dialing upstream for upgrade");

    let tcp = match timeout(CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            tracing::warn!(%session, error = %err, "upstream connect failed");
            return;
        }
        Err(_) => {
            tracing::warn!(%session, "upstream connect timed out");
            return;
        }
    };

    let handshake = serialize_handshake(&head, &target_url, &authority);

    if target::is_secure(&target_url) {
        let mut upstream = match tls::connect(tcp, &host).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(%session, error = %err, "upstream tls handshake failed");
                return;
            }
        };
        splice(session, &mut downstream, &mut upstream, &handshake, &early_data).await;
    } else {
        let mut upstream = tcp;
        splice(session, &mut downstream, &mut upstream, &handshake, &early_data).await;
    }
}

async fn splice<U>(
    session: Uuid,
    downstream: &mut TcpStream,
    upstream: &mut U,
    handshake: &[u8],
    early_data: &[u8],
) where
    U: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(err) = replay_handshake(upstream, handshake, early_data).await {
        tracing::warn!(%session, error = %err, "handshake replay failed");
        return;
    }

    match copy_bidirectional(downstream, upstream).await {
        Ok((to_upstream, to_downstream)) => {
            tracing::debug!(%session, to_upstream, to_downstream, "tunnel closed");
        }
        Err(err) => {
            tracing::debug!(%session, error = %err, "tunnel ended with error");
        }
    }

    let _ = downstream.shutdown().await;
    let _ = upstream.shutdown().await;
}

async fn replay_handshake<U>(upstream: &mut U, handshake: &[u8], early_data: &[u8]) -> io::Result<()>
where
    U: AsyncWrite + Unpin,
{
    upstream.write_all(handshake).await?;
    if !early_data.is_empty() {
        upstream.write_all(early_data).await?;
    }
    upstream.flush().await
}
