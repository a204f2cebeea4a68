use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    public_routes().merge(protected_routes().layer(middleware::from_fn(auth_middleware)))
}

/// Registration and token endpoints.
fn public_routes() -> Router {
    Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        .route("/auth/refresh", routing::post(handlers::refresh_token))
}

/// Everything that needs a bearer access token.
fn protected_routes() -> Router {
    Router::new()
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/forums", routing::post(handlers::forum::create_forum))
        .route("/forums/{id}", routing::get(handlers::forum::get_forum))
        .route(
            "/forums/{id}/participants",
            routing::get(handlers::forum::list_participants)
                .post(handlers::forum::add_participant),
        )
        .route(
            "/forums/{id}/users",
            routing::get(handlers::forum::list_participant_users),
        )
        .route("/forums/{id}/close", routing::post(handlers::forum::close_forum))
}
