use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;
use uuid::Uuid;

/// Logging middleware for request/response tracking. Each request gets a
/// short-lived id correlating the start and completion lines.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client = client_ip(request.headers());

    info!(
        target: "playbook_proxy::middleware",
        request_id = %request_id,
        method = %method,
        uri = %uri,
        client_ip = %client,
        "incoming request"
    );

    let response = next.run(request).await;

    info!(
        target: "playbook_proxy::middleware",
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        "request completed"
    );

    response
}

/// Client identity used as the quota bucket key. Trusts the forwarded
/// address headers set by the edge; clients without one share the
/// "unknown" bucket.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()) {
        return ip.trim().to_string();
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').next() {
            let first_ip = first_ip.trim();
            if !first_ip.is_empty() {
                return first_ip.to_string();
            }
        }
    }

    if let Some(ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return ip.trim().to_string();
    }

    "unknown".to_string()
}
