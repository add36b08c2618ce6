use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod dashboard;
pub mod home;
pub mod system;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(system::router())
}
