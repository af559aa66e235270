use axum::Router;
use axum::routing::get;

use crate::inbound::http::login::*;
use crate::inbound::state::LoginState;

pub fn create_router(state: LoginState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(google_login))
        .route("/callback", get(google_callback))
        .route("/github.login", get(github_login))
        .route("/github.callback", get(github_callback))
        .with_state(state)
}
