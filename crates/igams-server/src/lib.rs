pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Measurement
        .route(
            "/api/measurement/daily/{date}",
            get(routes::measurement::daily),
        )
        .route("/api/measurement/range", get(routes::measurement::range))
        .route(
            "/api/measurement/issues/{date}",
            get(routes::measurement::issues),
        )
        .route(
            "/api/measurement/inspect/{date}",
            get(routes::measurement::inspect),
        )
        // Control
        .route("/api/control/analyze", get(routes::control::analyze))
        // Advisory
        .route("/api/ai/analyze/{date}", get(routes::ai::analyze))
        .route("/api/ai/health", get(routes::ai::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Bind `0.0.0.0:<port>` and serve until the process exits.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(app_state, listener).await
}

/// Serve on a pre-bound listener, so callers can bind port 0 and read the
/// actual port first.
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("igams server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
