use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

/// Build the HTTP router. Serve it with `into_make_service_with_connect_info::<SocketAddr>()`
/// so the auth gate can see the peer address.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/health", get(handlers::public::health_get))
        // Protected API
        .merge(issue_routes(state.clone()))
        // Global middleware
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

fn issue_routes(state: AppState) -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route(
            "/issues",
            get(protected::list_issues).post(protected::create_issue),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_gate,
        ))
}
