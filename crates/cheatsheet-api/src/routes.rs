use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{get, post},
};

use crate::auth;
use crate::error::AppError;
use crate::export;
use crate::middleware::require_session;
use crate::sheets;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(sheets::index))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout_redirect).post(auth::logout));

    let protected_routes = Router::new()
        .route("/sheets/all", get(sheets::all_sheets))
        .route("/sheets/new", post(sheets::create_sheet))
        .route("/sheets/{id}", get(sheets::show_sheet).post(sheets::sheet_action))
        .route("/sheets/{id}/export", get(export::export_sheet))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found("page", uri.path())
}
