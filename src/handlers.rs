use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::CurrentUser,
    config::AppConfig,
    models::SessionUser,
    session::expired_cookie,
};

/// get_me
///
/// [Gated Route] Returns the identity attached to the current session. The access gate
/// has already redirected anonymous callers to the login page by the time this runs.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = SessionUser),
        (status = 307, description = "No session, redirected to the login page")
    )
)]
pub async fn get_me(CurrentUser(identity): CurrentUser) -> Json<SessionUser> {
    Json(SessionUser::from(identity))
}

/// logout
///
/// [Gated Route] Expires the access-token cookie and sends the browser to the login page.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Session cookie cleared"))
)]
pub async fn logout(
    CurrentUser(identity): CurrentUser,
    State(config): State<AppConfig>,
) -> Response {
    tracing::info!(user_id = %identity.id, "user signed out");

    let mut response = Redirect::to(&config.gate.login_path).into_response();
    if let Some(cookie) = expired_cookie(&config.session_cookie, config.secure_cookies()) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    response
}
