use std::time::Duration;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
    pub same_site: SameSite,
    pub http_only: bool,
}

pub const COOKIE_PATH: &str = "/";

/// Decides whether cookies should carry the Secure attribute for a request.
///
/// Order: first comma-separated value of `x-forwarded-proto`, then
/// `x-forwarded-scheme`, then the transport's own TLS flag. Defaults to
/// `false`, which suits local development; production deployments are
/// expected to sit behind a proxy that forwards the protocol headers.
pub fn resolve_secure(headers: Option<&HeaderMap>, transport_tls: Option<bool>) -> bool {
    if let Some(headers) = headers {
        if let Some(proto) = first_header_token(headers, "x-forwarded-proto") {
            return proto.eq_ignore_ascii_case("https");
        }
        if let Some(scheme) = first_header_token(headers, "x-forwarded-scheme") {
            return scheme.eq_ignore_ascii_case("https");
        }
    }
    transport_tls.unwrap_or(false)
}

fn first_header_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn build_cookie(
    name: &str,
    value: &str,
    max_age: Duration,
    path: &str,
    options: CookieOptions,
) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        name,
        value,
        path,
        max_age.as_secs(),
        same_site_value(options.same_site)
    );
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn build_clear_cookie(name: &str, path: &str, options: CookieOptions) -> String {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; SameSite={}",
        name,
        path,
        same_site_value(options.same_site)
    );
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

fn same_site_value(same_site: SameSite) -> &'static str {
    match same_site {
        SameSite::Lax => "Lax",
        SameSite::Strict => "Strict",
        SameSite::None => "None",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn resolve_secure_trusts_first_forwarded_proto_value() {
        let headers = headers_with("x-forwarded-proto", "https, http");
        assert!(resolve_secure(Some(&headers), Some(false)));

        let headers = headers_with("x-forwarded-proto", "http, https");
        assert!(!resolve_secure(Some(&headers), Some(true)));
    }

    #[test]
    fn resolve_secure_falls_back_to_scheme_then_transport() {
        let headers = headers_with("x-forwarded-scheme", "https");
        assert!(resolve_secure(Some(&headers), None));

        let headers = HeaderMap::new();
        assert!(resolve_secure(Some(&headers), Some(true)));
        assert!(!resolve_secure(Some(&headers), None));
        assert!(!resolve_secure(None, None));
    }

    #[test]
    fn build_cookie_includes_requested_attributes() {
        let opts = CookieOptions {
            secure: true,
            same_site: SameSite::Strict,
            http_only: true,
        };
        let cookie = build_cookie("folio_session", "abc", Duration::from_secs(3600), "/", opts);
        assert!(cookie.contains("folio_session=abc"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn build_cookie_omits_http_only_for_script_readable_cookies() {
        let opts = CookieOptions {
            secure: false,
            same_site: SameSite::Strict,
            http_only: false,
        };
        let cookie = build_cookie("folio_csrf", "tok", Duration::from_secs(60), "/", opts);
        assert!(!cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn build_clear_cookie_sets_max_age_zero() {
        let opts = CookieOptions {
            secure: false,
            same_site: SameSite::Strict,
            http_only: true,
        };
        let cookie = build_clear_cookie("folio_session", "/", opts);
        assert!(cookie.contains("folio_session="));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn extract_cookie_value_finds_matching_name() {
        let header = "a=1; folio_session=token-value; b=2";
        assert_eq!(
            extract_cookie_value(header, "folio_session").as_deref(),
            Some("token-value")
        );
        assert!(extract_cookie_value(header, "missing").is_none());
    }
}
