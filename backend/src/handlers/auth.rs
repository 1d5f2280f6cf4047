use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::user::{
        LoginRequest, LoginResponse, RealtimeTokenResponse, SessionEnvelope, User, UserResponse,
    },
    repositories::user as user_repo,
    services::{realtime::issue_realtime_token, session::SessionService},
    state::AppState,
    utils::password::verify_password,
};

fn cookie_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
}

fn append_cookies(mut response: Response, cookies: Vec<String>) -> Response {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Credentials arrive form-encoded. Failures never reveal whether the
/// identifier or the password was wrong.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, AppError> {
    let identifier = payload.identifier.trim();
    if identifier.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Identifier and password are required".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = user_repo::find_user_by_identifier(&state.pool, identifier)
        .await?
        .filter(|user| user.enabled)
        .ok_or_else(invalid)?;

    let matches = verify_password(&payload.password, &user.password_hash)
        .map_err(AppError::InternalServerError)?;
    if !matches {
        return Err(invalid());
    }

    let service = SessionService::new(&state);
    let record = service.create_session(&user).await?;
    let secure = service.secure_for(&headers);
    let cookies = service.issue_cookies(&record, secure);

    let body = Json(LoginResponse {
        token: record.token,
        user: UserResponse::from(user),
    });
    Ok(append_cookies(body.into_response(), cookies))
}

/// Destroys the session if one exists and clears every auth cookie. Always
/// answers success-shaped: logout must never fail visibly.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let service = SessionService::new(&state);
    if let Err(err) = service.destroy_session(cookie_header(&headers).as_deref()).await {
        tracing::warn!(error = ?err, "Session destruction failed during logout");
    }
    let secure = service.secure_for(&headers);
    let cookies = service.clearing_cookies(secure);
    append_cookies(Json(json!({"message": "Logged out"})).into_response(), cookies)
}

/// Session probe used by clients whose local state is not self-consistent.
/// A stale session cookie (expired or orphaned) is cleared in the response.
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let service = SessionService::new(&state);
    let raw = cookie_header(&headers);
    let session = service.get_session(raw.as_deref()).await?;

    let envelope = SessionEnvelope {
        authenticated: session.is_some(),
        user: session.map(|s| UserResponse::from(s.user)),
    };
    let authenticated = envelope.authenticated;
    let mut response = Json(envelope).into_response();

    let had_cookie = raw
        .as_deref()
        .map(|raw| raw.contains(state.config.session_cookie_name.as_str()))
        .unwrap_or(false);
    if !authenticated && had_cookie {
        let secure = service.secure_for(&headers);
        response = append_cookies(response, service.clearing_cookies(secure));
    }
    Ok(response)
}

/// Short-lived realtime hub credential. Session-gated by the route layer.
pub async fn realtime_token(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
) -> Json<RealtimeTokenResponse> {
    Json(issue_realtime_token(&state.config))
}

/// Full profile of the session user.
pub async fn profile(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
