use axum::routing::get;
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route(
            "/verify_login",
            get(handlers::verify_page).post(handlers::verify_submit),
        )
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register_submit),
        )
        .route(
            "/registration_statement",
            get(handlers::registration_statement),
        )
        .route("/logout", get(handlers::logout).post(handlers::logout))
}
