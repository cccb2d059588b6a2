//! HTTP server binding for a single source.
//!
//! Each source owns exactly one server: [`http_listen`] binds the TCP listener,
//! mounts the source's [`Dispatch`] at `/` for both `GET` and `POST`, and spawns
//! the axum serve loop. The returned [`ServerHandle`] is the source's transport
//! binding; shutting it down stops accepting connections and waits for the
//! serve loop to exit.
//!
//! ```text
//! 0.0.0.0:<port>
//! ├── POST /   → Dispatch::dispatch
//! ├── GET  /   → Dispatch::dispatch (experimentation)
//! └── *        → 404 / 405
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use spout_core::{BoxedDispatch, SourceRequest, SourceResponse, TransportError, TransportResult};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

// ─── Shared state ─────────────────────────────────────────────────────────────

/// State shared by every request served from one binding.
struct ServerState {
    dispatch: BoxedDispatch,
}

// ─── Server handle ────────────────────────────────────────────────────────────

/// A live transport binding.
///
/// Dropping the handle cancels the serve loop without waiting for it; call
/// [`ServerHandle::shutdown`] to stop and wait.
#[derive(Debug)]
pub struct ServerHandle {
    /// Identifier used in logs.
    id: String,
    /// The actual bind address resolved by the OS (includes ephemeral port).
    local_addr: SocketAddr,
    /// Cancellation token for the serve loop.
    shutdown_token: CancellationToken,
    /// The spawned serve loop.
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Returns the identifier of this binding.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns `true` while the serve loop is running and not cancelled.
    pub fn is_running(&self) -> bool {
        !self.shutdown_token.is_cancelled()
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops accepting connections and waits for the serve loop to exit.
    ///
    /// In-flight requests are not drained.
    pub async fn shutdown(mut self) -> TransportResult<()> {
        self.shutdown_token.cancel();
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| TransportError::Task(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

// ─── Public entry point ───────────────────────────────────────────────────────

/// Binds `addr` and serves `dispatch` at `/` for `GET` and `POST`.
///
/// Returns once the listener is bound and the serve loop has been spawned.
pub async fn http_listen(addr: &str, dispatch: BoxedDispatch) -> TransportResult<ServerHandle> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::BindFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(ServerState { dispatch });
    let router = build_router(state);
    let shutdown_token = CancellationToken::new();
    let token = shutdown_token.clone();

    let task = tokio::spawn(async move {
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        );
        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(error = %e, addr = %local_addr, "HTTP server error");
                }
            }
            () = token.cancelled() => {
                info!(addr = %local_addr, "HTTP server shutting down");
            }
        }
    });

    info!(addr = %local_addr, "HTTP server listening");

    Ok(ServerHandle {
        id: format!("http-server-{local_addr}"),
        local_addr,
        shutdown_token,
        task: Some(task),
    })
}

// ─── Router construction ──────────────────────────────────────────────────────

/// Builds the axum [`Router`] for one binding.
///
/// Only `/` is routed; axum answers **404** for other paths and **405** for
/// methods other than `GET` and `POST`.
fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(http_dispatch).post(http_dispatch))
        .with_state(state)
}

// ─── HTTP dispatch ────────────────────────────────────────────────────────────

/// Axum handler shared by `GET /` and `POST /`.
async fn http_dispatch(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = to_source_request(&method, &uri, &headers, body);
    trace!(
        remote_addr = %addr,
        method = %method,
        len = request.body().len(),
        "Received HTTP request",
    );

    let response = state.dispatch.dispatch(request).await;
    debug!(remote_addr = %addr, status = response.status(), "Request dispatched");

    into_response(response)
}

/// Converts axum request parts into a [`SourceRequest`].
fn to_source_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> SourceRequest {
    let mut request = SourceRequest::new(method.as_str(), uri.path());
    if let Some(query) = uri.query() {
        request = request.with_query(query);
        match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => {
                for (name, value) in pairs {
                    request = request.with_query_param(name, value);
                }
            }
            Err(e) => debug!(query, error = %e, "Ignoring undecodable query string"),
        }
    }
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            request = request.with_header(name.as_str(), v);
        }
    }
    request.with_body(body.to_vec())
}

/// Converts a [`SourceResponse`] into an axum [`Response`].
fn into_response(response: SourceResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let content_type = match (response.charset(), response.body().is_empty()) {
        (Some(charset), _) => {
            HeaderValue::from_str(&format!("text/plain; charset={charset}")).ok()
        }
        (None, false) => Some(HeaderValue::from_static("text/plain; charset=utf-8")),
        (None, true) => None,
    };

    let mut http_response = (status, Body::from(response.body().to_string())).into_response();
    if let Some(value) = content_type {
        http_response
            .headers_mut()
            .insert(header::CONTENT_TYPE, value);
    }
    http_response
}
