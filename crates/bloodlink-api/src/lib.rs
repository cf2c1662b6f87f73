pub mod auth;
pub mod donor;
pub mod error;
pub mod extract;
pub mod health;
pub mod hospital;
pub mod middleware;
pub mod profile;
pub mod state;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

use crate::middleware::{require_auth, require_donor, require_hospital};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    // Layers run bottom-up: authenticate first, then check the role.
    let donor_routes = Router::new()
        .route("/requests/nearby", get(donor::nearby_requests))
        .route("/requests/{id}/respond", post(donor::respond))
        .route("/responses", get(donor::list_responses))
        .route("/responses/{id}/donated", post(donor::mark_donated))
        .route("/responses/{id}", delete(donor::withdraw))
        .route("/profile", get(profile::get_profile).patch(profile::update_profile))
        .layer(from_fn(require_donor))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let hospital_routes = Router::new()
        .route(
            "/requests",
            get(hospital::list_requests).post(hospital::create_request),
        )
        .route("/profile", get(profile::get_profile).patch(profile::update_profile))
        .layer(from_fn(require_hospital))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .nest("/api/donor", donor_routes)
        .nest("/api/hospital", hospital_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
