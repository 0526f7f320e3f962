use http::header::CONTENT_TYPE;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{HeaderMap, Request, Response, StatusCode, Uri, header::HeaderValue};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Bind `host:port` and serve connections with the given hyper service
/// until the listener fails. Each accepted connection is handled on its
/// own task.
pub async fn run_http_service<S, E>(host: &str, port: u16, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<BoxBody<Bytes, E>>, Error = E>
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    E: From<std::io::Error> + std::error::Error + Send + Sync + 'static,
{
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!(host, port, "listening");
    let service_arc = Arc::new(service);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let svc = service_arc.clone();

        // Hand the connection to hyper; auto-detect h1/h2 on this socket
        tokio::spawn(async move {
            if let Err(err) = Builder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                tracing::debug!(%peer_addr, %err, "connection closed with error");
            }
        });
    }
}

/// Plain-text error response carrying the status code's canonical reason.
pub fn make_error_response<E: 'static>(status_code: StatusCode) -> Response<BoxBody<Bytes, E>> {
    let message = status_code
        .canonical_reason()
        .unwrap_or("an error occurred");

    let mut response = Response::new(
        Full::new(Bytes::from(message))
            .map_err(|never| match never {})
            .boxed(),
    );
    *response.status_mut() = status_code;
    response
}

/// JSON error response in the shape the control API uses:
/// `{"message": "..."}`.
pub fn make_json_error<E: 'static>(
    status_code: StatusCode,
    message: &str,
) -> Response<BoxBody<Bytes, E>> {
    let body = serde_json::json!({ "message": message }).to_string();

    let mut response = Response::new(
        Full::new(Bytes::from(body))
            .map_err(|never| match never {})
            .boxed(),
    );
    *response.status_mut() = status_code;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// The request's virtual host, with any `:port` suffix stripped and
/// lowercased. Read from the Host header, falling back to the URI
/// authority for requests (HTTP/2 and absolute-form HTTP/1) that carry
/// the host there instead. IPv6 literals yield the bare address without
/// brackets. `None` when neither source names a host.
pub fn request_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(hyper::header::HOST)
        .and_then(|value| value.to_str().ok());
    let raw = from_header
        .or_else(|| uri.authority().map(|authority| authority.as_str()))?
        .trim();

    // `[::1]:8080` splits on `]`, everything else on the port colon.
    let host = match raw.strip_prefix('[') {
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => raw.split(':').next().unwrap_or(raw),
    };
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
