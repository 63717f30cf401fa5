use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::read_session;
use crate::state::AppState;

/// Validate the session cookie and expose its claims to the handler.
/// Requests without a valid session are sent to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(claims) = read_session(&jar, &state.session_secret) else {
        debug!(path = %req.uri().path(), "No valid session, redirecting to login");
        return Redirect::to("/login").into_response();
    };

    req.extensions_mut().insert(claims);
    next.run(req).await
}
