use axum::http::{header, HeaderMap};
use chrono::Duration;
use cookie::{
    time::{self, OffsetDateTime},
    Cookie, SameSite,
};

pub const AUTH_COOKIE: &str = "auth_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

fn base_cookie(name: &str, value: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build()
}

/// `Set-Cookie` value for an HttpOnly, SameSite=Lax cookie on `/`.
pub fn build_cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
    let max_age = time::Duration::seconds(max_age.num_seconds());
    let mut cookie = base_cookie(name, value, secure);
    cookie.set_max_age(max_age);
    cookie.set_expires(OffsetDateTime::now_utc() + max_age);
    cookie.to_string()
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    let mut cookie = base_cookie(name, "", secure);
    cookie.make_removal();
    cookie.to_string()
}

/// First non-empty value of `name` across all `Cookie` headers. Surrounding
/// double quotes are stripped.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value).filter_map(|cookie| cookie.ok()))
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_build_cookie_attributes() {
        let cookie = build_cookie(AUTH_COOKIE, "abc", Duration::minutes(15), false);
        assert!(cookie.starts_with("auth_token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(cookie.contains("Expires="));
        assert!(cookie.ends_with(" GMT"));
        assert!(!cookie.contains("Secure"));

        let secure = build_cookie(AUTH_COOKIE, "abc", Duration::minutes(15), true);
        assert!(secure.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_cookie(REFRESH_COOKIE, false);
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires="));
    }

    #[test]
    fn test_read_cookie_from_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=jwt123"));
        headers.append(header::COOKIE, HeaderValue::from_static("refresh_token=r1"));

        assert_eq!(read_cookie(&headers, AUTH_COOKIE).as_deref(), Some("jwt123"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE).as_deref(), Some("r1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_cookie_unquotes_and_keeps_padding() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("oauth_state=\"csrf-1\"; auth_token=a.b=="),
        );

        assert_eq!(read_cookie(&headers, OAUTH_STATE_COOKIE).as_deref(), Some("csrf-1"));
        assert_eq!(read_cookie(&headers, AUTH_COOKIE).as_deref(), Some("a.b=="));
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token="));
        assert_eq!(read_cookie(&headers, AUTH_COOKIE), None);
    }
}
