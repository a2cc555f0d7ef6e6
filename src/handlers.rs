use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ProxyError;
use crate::middleware::client_ip;
use crate::prompt;
use crate::provider::GenerationClient;
use crate::rate_limiter::{Admission, RateLimiter};
use crate::response::{HealthResponse, PlaybookResponse};
use crate::store::QuotaStore;
use crate::validation::RequestValidator;

/// Immutable per-process state shared by all requests. Cross-request state
/// lives only in the quota store.
pub struct AppState {
    pub rate_limiter: RateLimiter,
    pub generator: GenerationClient,
    pub store: Arc<dyn QuotaStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn QuotaStore>, generator: GenerationClient) -> Self {
        Self {
            rate_limiter: RateLimiter::new(store.clone()),
            generator,
            store,
        }
    }
}

/// Generate a trip playbook: validate, check quota, build the prompt, call
/// the provider (with retry), and only then charge the client's counter.
pub async fn generate_playbook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ProxyError> {
    let request = RequestValidator::parse_playbook_request(&body)?;
    let client_id = client_ip(&headers);

    let current = match state.rate_limiter.check(&client_id).await? {
        Admission::Denied => return Err(ProxyError::RateLimited),
        Admission::Admitted { current } => current,
    };

    let payload = prompt::build(&request);
    let text = state.generator.generate(&payload).await?;

    // The counter write runs on its own task: once generation succeeded, a
    // client disconnect must not cancel the charge mid-write.
    let limiter = state.rate_limiter.clone();
    let write = tokio::spawn(async move { limiter.commit(&client_id, current).await });
    write
        .await
        .map_err(|e| ProxyError::StoreUnavailable(format!("quota write task failed: {}", e)))??;

    Ok(Json(PlaybookResponse::new(text)))
}

/// CORS preflight; the CORS layer attaches the allow headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Fallback for unsupported methods on /generate.
pub async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store_connected = state.store.ping().await.is_ok();
    Json(HealthResponse::healthy(store_connected))
}
