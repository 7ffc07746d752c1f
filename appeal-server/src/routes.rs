use std::collections::HashMap;
use std::future::Future;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;
use tracing::error;

use appeal_core::Data;
use appeal_handlers::{
    CALLBACK_PATH, SUBMIT_PATH, StageReply, StageRequest, UNBAN_PATH, handle_oauth_callback,
    handle_submission, handle_unban,
};

const MAX_FORM_BYTES: usize = 64 * 1024;

/// Method checks happen inside the stages, so every route accepts any verb.
pub fn router(data: Data) -> Router {
    Router::new()
        .route(CALLBACK_PATH, any(oauth_callback))
        .route(SUBMIT_PATH, any(submit))
        .route(UNBAN_PATH, any(unban))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(data)
}

fn stage_request(
    method: Method,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
) -> StageRequest {
    StageRequest {
        method,
        query,
        headers,
        body,
    }
}

/// Upstream failures become a bare 500; details stay in the log.
async fn respond<F>(stage: &'static str, outcome: F) -> Response
where
    F: Future<Output = anyhow::Result<StageReply>>,
{
    match outcome.await {
        Ok(reply) => reply.into_response(),
        Err(error) => {
            error!(?error, stage, "request stage failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn oauth_callback(
    State(data): State<Data>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request = stage_request(method, query, headers, Bytes::new());
    respond("oauth-callback", handle_oauth_callback(&data, &request)).await
}

async fn submit(
    State(data): State<Data>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = stage_request(method, query, headers, body);
    respond("submission", handle_submission(&data, &request)).await
}

async fn unban(
    State(data): State<Data>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request = stage_request(method, query, headers, Bytes::new());
    respond("unban", handle_unban(&data, &request)).await
}

async fn health() -> &'static str {
    "ok"
}
