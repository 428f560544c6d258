//! Wayfarer HTTP server.
//!
//! Exposes the access and quota guard over a small JSON API: image metadata
//! updates (single and bulk), moves between experiences, signed downloads,
//! storage status and upload checks. The server library is used by the
//! standalone binary, the unified CLI and the integration tests.

mod auth;
pub mod cli;
mod error;
mod handler;
mod server;
mod state;

pub use auth::AuthUser;
pub use cli::ServerArgs;
pub use error::{ApiError, ServerError, status_for};
pub use server::{DEFAULT_SHUTDOWN_TIMEOUT, build_router, run, run_with_shutdown, serve};
pub use state::AppState;
pub use tokio_util::sync::CancellationToken;
