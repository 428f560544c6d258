//! Router assembly and the serve loop.

use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::{get, patch, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wayfarer_config::Config;
use wayfarer_metrics::{record_request, record_request_duration};

use crate::error::ServerError;
use crate::handler::{self, blobs, experiences, images, storage};
use crate::state::AppState;

/// Default graceful shutdown timeout.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration =
    Duration::from_secs(wayfarer_core::DEFAULT_SHUTDOWN_TIMEOUT_SECS);

/// Build the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.max_upload_bytes;
    Router::new()
        .route("/health", get(handler::health))
        .route("/api/tiers", get(handler::list_tiers))
        .route("/api/storage", get(storage::status).post(storage::check))
        .route("/api/images", get(images::list).post(images::upload))
        .route("/api/images/metadata", patch(images::bulk_update_metadata))
        .route("/api/images/download", get(images::download))
        .route("/api/images/{id}", axum::routing::delete(images::delete))
        .route("/api/images/{id}/metadata", patch(images::update_metadata))
        .route("/api/images/{id}/move", post(images::move_image))
        .route(
            "/api/experiences",
            get(experiences::list).post(experiences::create),
        )
        .route("/blobs/{*path}", get(blobs::serve))
        .layer(from_fn(track_metrics))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// Count and time every request by its route template.
async fn track_metrics(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let start = Instant::now();
    let resp = next.run(req).await;
    record_request(&route, resp.status().as_u16());
    record_request_duration(&route, start.elapsed().as_secs_f64());
    resp
}

/// Serve on an already bound listener until `shutdown` fires, then give
/// in-flight requests up to `grace` to finish.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<(), ServerError> {
    let app = build_router(state);
    let stop = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(stop.cancelled_owned())
            .await
    });

    tokio::select! {
        res = &mut server => return flatten(res),
        _ = shutdown.cancelled() => {
            info!("shutdown signal received, draining requests");
        }
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(res) => {
            flatten(res)?;
            info!("all requests drained");
        }
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "shutdown timeout, aborting open requests");
            server.abort();
        }
    }
    info!("server stopped");
    Ok(())
}

fn flatten(
    res: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match res {
        Ok(inner) => Ok(inner?),
        Err(e) => Err(ServerError::Io(std::io::Error::other(e))),
    }
}

/// Run the server with a cancellation token for graceful shutdown.
pub async fn run_with_shutdown(
    config: Config,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let state = AppState::from_config(&config).await?;
    let listener = TcpListener::bind(&config.server.listen).await?;
    info!(
        listen = %listener.local_addr()?,
        max_upload_bytes = config.server.max_upload_bytes,
        "wayfarer server listening"
    );
    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    serve(listener, state, shutdown, grace).await
}

/// Run the server (blocking until error, no graceful shutdown).
pub async fn run(config: Config) -> Result<(), ServerError> {
    run_with_shutdown(config, CancellationToken::new()).await
}
