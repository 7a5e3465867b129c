//! HTTP service for a pcmesh node.
//!
//! `GET /health` is answered without authentication. Every other request must
//! carry valid authentication headers: accepted requests receive the resolved
//! principal as JSON, rejected ones receive the same `401` whatever the cause.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::Service;
use pcmesh_auth::{AuthOutcome, Verifier};
use tracing::debug;

/// Response body used by the node.
pub type NodeBody = Full<Bytes>;

/// Body of every rejected request.
const UNAUTHORIZED_BODY: &str = r#"{"error":"Unauthorized"}"#;

/// Hyper service that authenticates peer requests.
#[derive(Debug, Clone)]
pub struct NodeService {
    verifier: Verifier,
    version: &'static str,
}

impl NodeService {
    /// Create a new node service around a verifier.
    pub fn new(verifier: Verifier, version: &'static str) -> Self {
        Self { verifier, version }
    }

    /// Handle one request. The body is never read.
    pub fn handle<B>(&self, req: http::Request<B>) -> http::Response<NodeBody> {
        if is_health_check(req.method(), req.uri().path()) {
            return health_check_response(self.version);
        }

        let (parts, _body) = req.into_parts();
        match self.verifier.authenticate(&parts) {
            AuthOutcome::Accepted(principal) => {
                debug!(method = %parts.method, path = parts.uri.path(), "Request authenticated");
                let body = serde_json::json!({
                    "principal": principal,
                    "path": parts.uri.path(),
                });
                json_response(http::StatusCode::OK, body.to_string())
            }
            AuthOutcome::Rejected(_) => unauthorized_response(),
        }
    }
}

impl Service<http::Request<Incoming>> for NodeService {
    type Response = http::Response<NodeBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let resp = self.handle(req);
        Box::pin(async { Ok(resp) })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == "/health"
}

fn health_check_response(version: &str) -> http::Response<NodeBody> {
    let body = serde_json::json!({ "status": "running", "version": version });
    json_response(http::StatusCode::OK, body.to_string())
}

/// The single response given to unauthenticated requests.
fn unauthorized_response() -> http::Response<NodeBody> {
    json_response(http::StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY.to_owned())
}

fn json_response(status: http::StatusCode, body: String) -> http::Response<NodeBody> {
    http::Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("static response parts should be valid")
}
