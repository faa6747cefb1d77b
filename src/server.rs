//! Gateway server: listener lifecycle, upgrade interception, dispatch.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → head sniff (raw bytes, bounded)
//!     ├── Upgrade + /api → proxy::tunnel (raw splice, no HTTP framing)
//!     └── anything else  → rewind sniffed bytes → hyper/axum service
//!                           ├── /config   → runtime config as JSON
//!                           ├── /api/...  → proxy::forward
//!                           └── fallback  → assets::serve
//! ```
//!
//! # Design Decisions
//! - Upgrades are intercepted before any HTTP framing exists so the
//!   backend's `101` can flow to the client byte-for-byte
//! - Handlers read the backend location through the provider on every
//!   request; the value may change between requests and is never cached

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::assets;
use crate::config::{ConfigProvider, GatewayConfig};
use crate::net::rewind::RewindStream;
use crate::net::CONNECT_TIMEOUT;
use crate::proxy::{forward, target, tunnel};

/// Shared state injected into request handlers.
#[derive(Clone)]
pub struct GatewayState {
    static_root: Arc<PathBuf>,
    provider: ConfigProvider,
    client: reqwest::Client,
}

/// The embedded HTTP gateway.
pub struct GatewayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: GatewayState,
}

impl GatewayServer {
    /// Bind the listener. Port 0 picks a free ephemeral port; the actual
    /// address is available through [`local_addr`](Self::local_addr).
    pub async fn bind(config: GatewayConfig, provider: ConfigProvider) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        let local_addr = listener.local_addr()?;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(std::io::Error::other)?;

        tracing::info!(
            address = %local_addr,
            static_root = %config.static_root.display(),
            "gateway bound"
        );

        Ok(Self {
            listener,
            local_addr,
            state: GatewayState {
                static_root: Arc::new(config.static_root),
                provider,
                client,
            },
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://host:port/` with the actually bound port.
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.local_addr)
    }

    /// Spawn the accept loop and return a handle for stopping it.
    pub fn start(self) -> GatewayHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let base_url = self.base_url();
        let local_addr = self.local_addr;
        let listener = self.listener;
        let state = self.state;
        let router = build_router(state.clone());

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, peer)) => {
                                let state = state.clone();
                                let router = router.clone();
                                tokio::spawn(async move {
                                    if let Err(err) = serve_connection(stream, state, router).await {
                                        tracing::debug!(%peer, error = %err, "connection ended with error");
                                    }
                                });
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "accept failed");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("gateway stopping");
                        break;
                    }
                }
            }
        });

        GatewayHandle {
            base_url,
            local_addr,
            shutdown_tx,
            task,
        }
    }
}

/// Handle to a running gateway. [`close`](Self::close) stops the accept
/// loop; dropping the handle has the same effect.
pub struct GatewayHandle {
    base_url: String,
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl GatewayHandle {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections. Idempotent; closing an already
    /// closed gateway is a no-op. In-flight connections are not drained.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for the accept loop to finish.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

/// Serve one accepted connection: sniff the first request head, hand
/// upgrades for the proxied namespace to the tunnel, and run everything
/// else through the HTTP service with the sniffed bytes replayed.
async fn serve_connection(
    mut stream: TcpStream,
    state: GatewayState,
    router: Router,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut sniffed = Vec::new();
    let head_end = tunnel::read_head(&mut stream, &mut sniffed).await?;

    if let Some(head_end) = head_end {
        if let Some(head) = std::str::from_utf8(&sniffed[..head_end])
            .ok()
            .and_then(tunnel::RequestHead::parse)
        {
            if tunnel::wants_tunnel(&head) {
                let early_data = sniffed[head_end..].to_vec();
                let runtime = (state.provider)();
                tunnel::run(stream, head, early_data, runtime).await;
                return Ok(());
            }
        }
    }

    let io = TokioIo::new(RewindStream::new(stream, sniffed));
    let service = hyper::service::service_fn(move |request: Request<Incoming>| {
        router.clone().oneshot(request)
    });
    http1::Builder::new().serve_connection(io, service).await?;
    Ok(())
}

fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", any(dispatch))
        .route("/{*path}", any(dispatch))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Classify a request by path: config endpoint, proxied namespace, or
/// static asset.
async fn dispatch(State(state): State<GatewayState>, req: Request) -> Response {
    let path = req.uri().path().to_owned();

    if path == "/config" {
        return config_endpoint(&state);
    }

    if target::is_proxy_path(&path) {
        let runtime = (state.provider)();
        return forward::forward(&state.client, &runtime, req).await;
    }

    assets::serve(&state.static_root, &path).await
}

/// Current backend configuration; never cacheable, so the UI always sees
/// reconfiguration immediately.
fn config_endpoint(state: &GatewayState) -> Response {
    let runtime = (state.provider)();
    let mut response = Json(runtime).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}
