use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Uri, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ProxyError;
use crate::server::AppState;
use crate::transforms::{prepare_request, stream_strip_oc_prefix};

/// Request headers the transport computes itself. `content-length` is stale
/// once the body has been re-serialized.
const STRIPPED_REQUEST_HEADERS: [header::HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::HOST,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
];

/// Hop-by-hop response headers re-framed by the server.
const STRIPPED_RESPONSE_HEADERS: [header::HeaderName; 2] =
    [header::CONNECTION, header::TRANSFER_ENCODING];

/// Catch-all handler: forward any request to the upstream.
pub async fn forward(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match forward_request(&state, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!("Proxy request failed: {err}");
            err.into_response()
        }
    }
}

async fn forward_request(state: &AppState, request: Request) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    let prepared = prepare_request(body);
    let url = upstream_url(&state.upstream, &parts.uri);

    tracing::debug!(
        method = %parts.method,
        url = %url,
        is_anthropic = prepared.is_anthropic,
        "Forwarding request"
    );

    let mut req_builder = state
        .http_client
        .request(parts.method, &url)
        .headers(forward_request_headers(&parts.headers));
    if let Some(body) = prepared.body {
        req_builder = req_builder.body(body);
    }

    let response = req_builder.send().await?;
    Ok(build_response(response, prepared.is_anthropic))
}

/// `<upstream><path>?<query>`; path and query are forwarded untouched.
pub fn upstream_url(upstream: &str, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{upstream}{path_and_query}")
}

/// Copy inbound headers for the upstream request, minus the framing headers.
pub fn forward_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in &STRIPPED_REQUEST_HEADERS {
        forwarded.remove(name);
    }
    forwarded
}

/// Copy upstream response headers. A transformed body has a different length,
/// so its `content-length` is dropped too.
pub fn forward_response_headers(headers: &HeaderMap, transformed: bool) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in &STRIPPED_RESPONSE_HEADERS {
        forwarded.remove(name);
    }
    if transformed {
        forwarded.remove(header::CONTENT_LENGTH);
    }
    forwarded
}

/// Relay the upstream response with its status and headers, streaming the
/// body through the tool-name transform when the request was active.
fn build_response(upstream: reqwest::Response, is_anthropic: bool) -> Response {
    let status = upstream.status();
    let headers = forward_response_headers(upstream.headers(), is_anthropic);

    let body = if is_anthropic {
        Body::from_stream(stream_strip_oc_prefix(upstream.bytes_stream()))
    } else {
        Body::from_stream(upstream.bytes_stream())
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
