//! HTTP surface for the advisor agent
//!
//! - `GET /` - liveness text
//! - `GET /query` - diagnostic text confirming the route is mounted
//! - `POST /query` - `{"query": "..."}` in, `{"answer": "..."}` or `{"error": "..."}` out

use crate::agent::QueryAgent;
use crate::error::{AdvisorError, AdvisorResult};
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, Instrument};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Reply;
use warp::Filter;

pub const HEALTH_MESSAGE: &str = "Server is running!";
pub const QUERY_PROBE_MESSAGE: &str =
    "The /query endpoint is working! It's ready for POST requests.";
pub const MISSING_QUERY_MESSAGE: &str = "Missing query in request body";

/// Largest POST /query body buffered before the request is rejected with 413
pub const MAX_QUERY_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, Serialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the route tree around a shared agent
pub fn routes(
    agent: Arc<dyn QueryAgent>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    // GET / - health check
    let index_route = warp::path::end()
        .and(warp::get())
        .map(|| HEALTH_MESSAGE);

    // GET /query - diagnostic probe
    let query_probe_route = warp::path("query")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| QUERY_PROBE_MESSAGE);

    // POST /query - run the agent; the body is parsed as JSON whatever its content type
    let query_route = warp::path("query")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_QUERY_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_agent(agent))
        .and_then(handle_query);

    index_route
        .or(query_probe_route)
        .or(query_route)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec!["GET", "POST"])
                .allow_headers(vec!["content-type"]),
        )
        .with(warp::trace::request())
}

fn with_agent(
    agent: Arc<dyn QueryAgent>,
) -> impl Filter<Extract = (Arc<dyn QueryAgent>,), Error = Infallible> + Clone {
    warp::any().map(move || agent.clone())
}

/// Pull the query text out of a request body (pure function)
///
/// The body must be a JSON object with a non-null `query`. Strings pass
/// through as-is; any other JSON value is handed over as its JSON text.
pub fn extract_query(body: &[u8]) -> Option<String> {
    let parsed: Value = serde_json::from_slice(body).ok()?;
    match parsed.as_object()?.get("query")? {
        Value::Null => None,
        Value::String(query) => Some(query.clone()),
        other => Some(other.to_string()),
    }
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

async fn handle_query(
    body: Bytes,
    agent: Arc<dyn QueryAgent>,
) -> Result<warp::reply::Response, Infallible> {
    let request_id = Uuid::new_v4();

    let reply = async move {
        let Some(query) = extract_query(&body) else {
            info!("Rejected query request without a query field");
            return json_reply(
                &ErrorResponse {
                    error: MISSING_QUERY_MESSAGE.to_string(),
                },
                StatusCode::BAD_REQUEST,
            );
        };

        info!(query_length = query.len(), "Handling query");

        match agent.answer(&query).await {
            Ok(answer) => json_reply(&AnswerResponse { answer }, StatusCode::OK),
            Err(e) => {
                error!("Agent invocation failed: {}", e);
                json_reply(
                    &ErrorResponse {
                        error: e.to_string(),
                    },
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        }
    }
    .instrument(crate::query_span!(request_id = %request_id))
    .await;

    Ok(reply)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve(
    bind_address: &str,
    agent: Arc<dyn QueryAgent>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> AdvisorResult<()> {
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        AdvisorError::invalid_input(format!("Invalid bind address '{bind_address}': {e}"))
    })?;

    let (bound, server) = warp::serve(routes(agent))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| AdvisorError::internal_error(format!("Failed to bind {addr}: {e}")))?;

    info!("Market advisor listening on http://{}", bound);
    server.await;
    info!("HTTP server stopped");
    Ok(())
}
