//! Router assembly and server loop.

use crate::routes;
use crate::state::ApiContext;
use axum::routing::get;
use axum::Router;
use log::info;

/// Builds the full application router. Shared with the API test suite.
pub fn app(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(|| async { "healthy" }))
        .nest("/api/v1", routes::router())
        .with_state(ctx)
}

/// Binds the listener and serves until the process is stopped.
pub async fn setup_and_serve(ctx: ApiContext, port: u16) -> Result<(), String> {
    let router = app(ctx);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|err| format!("failed to bind port {port}: {err}"))?;

    info!("event=serve module=api status=start port={port}");
    axum::serve(listener, router)
        .await
        .map_err(|err| format!("server error: {err}"))
}
