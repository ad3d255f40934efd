use axum::Router;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::constants::UPSTREAM_CONNECT_TIMEOUT_SECS;
use crate::error::ProxyError;
use crate::routes;

/// Shared, read-only state for all request handlers.
pub struct AppState {
    pub http_client: Client,
    /// Upstream base URL without a trailing slash
    pub upstream: String,
}

impl AppState {
    pub fn new(upstream: impl Into<String>) -> Result<Self, ProxyError> {
        // Shared HTTP client with connection pooling. No total timeout: streamed
        // responses can run for a long time.
        // Encoded upstream bodies are decoded here, before the name rewrite sees
        // them; reqwest then drops `content-encoding` and `content-length`.
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .zstd(true)
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            http_client,
            upstream: upstream.into(),
        })
    }
}

/// Every method and path is forwarded; there is no routing beyond that.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(routes::proxy::forward)
        .with_state(state)
}

/// Listen on `config.host:config.port` and forward everything to
/// `config.upstream` until Ctrl-C.
pub async fn start_proxy(config: &Config) -> Result<(), ProxyError> {
    let state = Arc::new(AppState::new(&config.upstream)?);
    let listener = TcpListener::bind(config.listen_addr()).await?;

    info!("Listening on http://{}", listener.local_addr()?);
    info!("Proxying to: {}", config.upstream);
    info!("Endpoint: http://localhost:{}/v1", config.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_any_path_reaches_forwarder() {
        // Nothing listens on port 1, so every forwarded request fails fast
        let state = Arc::new(AppState::new("http://127.0.0.1:1").unwrap());

        for (method, uri) in [("GET", "/"), ("POST", "/v1/messages"), ("DELETE", "/a/b?c=d")] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = router(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "{method} {uri}");
        }
    }
}
