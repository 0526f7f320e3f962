use crate::errors::GatewayError;
use crate::metrics_defs;
use http::Uri;
use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HOST, HeaderValue};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode, Version};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use routes::table::RoutingTable;
use shared::headers::{add_via_header, filter_hop_by_hop};
use shared::http::{make_json_error, request_host};
use shared::{counter, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Per-request dispatch: resolve the Host header against the routing
/// table and relay the request to `http://<host>:<port>`.
///
/// The service is stateless between requests; the hyper client is built
/// once and pools backend connections across requests.
pub struct GatewayService<B = Incoming> {
    table: Arc<RoutingTable>,
    client: Client<HttpConnector, B>,
    timeout_secs: u64,
}

impl<B> GatewayService<B>
where
    B: Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(table: Arc<RoutingTable>, timeout_secs: u64) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        GatewayService {
            table,
            client,
            timeout_secs,
        }
    }
}

impl<B> Service<Request<B>> for GatewayService<B>
where
    B: Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = Response<BoxBody<Bytes, GatewayError>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let table = Arc::clone(&self.table);
        let client = self.client.clone();
        let timeout_secs = self.timeout_secs;
        Box::pin(dispatch(table, client, req, timeout_secs))
    }
}

/// One forwarding attempt per request; every failure degrades to an
/// error response rather than an error on the connection.
async fn dispatch<B>(
    table: Arc<RoutingTable>,
    client: Client<HttpConnector, B>,
    req: Request<B>,
    timeout_secs: u64,
) -> Result<Response<BoxBody<Bytes, GatewayError>>, GatewayError>
where
    B: Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let Some(host) = request_host(req.uri(), req.headers()) else {
        return Ok(make_json_error(
            StatusCode::BAD_REQUEST,
            "missing Host header",
        ));
    };

    let Some(port) = table.get(&host) else {
        tracing::debug!(%host, "no route for host");
        counter!(metrics_defs::REQUESTS_UNMATCHED).increment(1);
        return Ok(make_json_error(
            StatusCode::NOT_FOUND,
            "no route for host",
        ));
    };

    // The domain doubles as the backend hostname; only the port is
    // injected from the routing table. IPv6 addresses go back into
    // brackets for the authority form.
    let authority = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target: Uri = match format!("http://{authority}{path_and_query}").parse() {
        Ok(uri) => uri,
        Err(err) => {
            tracing::error!(%host, %port, %err, "stored route produced an invalid target");
            return Ok(make_json_error(
                StatusCode::BAD_GATEWAY,
                "invalid backend target",
            ));
        }
    };
    let Ok(host_value) = HeaderValue::from_str(&authority) else {
        return Ok(make_json_error(
            StatusCode::BAD_REQUEST,
            "invalid Host header",
        ));
    };

    let (mut parts, body) = req.into_parts();
    let inbound_version = parts.version;
    filter_hop_by_hop(&mut parts.headers, inbound_version);
    add_via_header(&mut parts.headers, inbound_version);
    // Standard reverse-proxy Host correction: the backend sees the
    // resolved host:port, not the client-facing authority.
    parts.headers.insert(HOST, host_value);
    parts.uri = target;
    // Backends are plain-HTTP origin servers; pin the upstream hop to
    // h1 regardless of what the client spoke to us.
    parts.version = Version::HTTP_11;
    let outbound = Request::from_parts(parts, body);

    let started = Instant::now();
    let response = match timeout(
        Duration::from_secs(timeout_secs),
        client.request(outbound),
    )
    .await
    {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::warn!(%host, %port, %err, "upstream request failed");
            counter!(metrics_defs::UPSTREAM_FAILURES).increment(1);
            return Ok(make_json_error(
                StatusCode::BAD_GATEWAY,
                "upstream unreachable",
            ));
        }
        Err(_) => {
            tracing::warn!(%host, %port, timeout_secs, "upstream request timed out");
            counter!(metrics_defs::UPSTREAM_FAILURES).increment(1);
            return Ok(make_json_error(
                StatusCode::GATEWAY_TIMEOUT,
                "upstream timeout",
            ));
        }
    };

    counter!(metrics_defs::REQUESTS_FORWARDED).increment(1);
    histogram!(metrics_defs::UPSTREAM_DURATION).record(started.elapsed().as_secs_f64());

    // Stream the body back as-is; only headers are touched.
    let (mut parts, body) = response.into_parts();
    let outbound_version = parts.version;
    filter_hop_by_hop(&mut parts.headers, outbound_version);
    add_via_header(&mut parts.headers, outbound_version);
    Ok(Response::from_parts(
        parts,
        body.map_err(GatewayError::from).boxed(),
    ))
}
