use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::session::SessionService, state::AppState};

fn cookie_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
}

fn is_mutating(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD && *method != Method::OPTIONS
}

/// Requires any valid session; inserts the resolved user and session
/// context into request extensions.
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let service = SessionService::new(&state);
    let cookies = cookie_header(request.headers());
    let session = service
        .get_session(cookies.as_deref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    request.extensions_mut().insert(session.user.clone());
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Requires an admin session. Mutating verbs additionally require the CSRF
/// header to match the session's stored CSRF token.
pub async fn session_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let service = SessionService::new(&state);
    let cookies = cookie_header(request.headers());

    let session = if is_mutating(request.method()) {
        service
            .assert_csrf(cookies.as_deref(), request.headers())
            .await
    } else {
        service.require_admin_session(cookies.as_deref()).await
    }
    .map_err(AppError::from)?;

    request.extensions_mut().insert(session.user.clone());
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutating_verbs_cover_everything_but_safe_methods() {
        assert!(!is_mutating(&Method::GET));
        assert!(!is_mutating(&Method::HEAD));
        assert!(!is_mutating(&Method::OPTIONS));
        assert!(is_mutating(&Method::POST));
        assert!(is_mutating(&Method::PUT));
        assert!(is_mutating(&Method::DELETE));
        assert!(is_mutating(&Method::PATCH));
    }
}
