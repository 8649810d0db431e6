use crate::config::CookieSettings;
use axum_extra::extract::CookieJar;
use chrono::Duration;

/// Cookie names for token storage
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Header carrying a refresh token for non-browser clients
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh";

/// SameSite cookie attribute for CSRF protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict mode - cookie not sent with cross-site requests
    Strict,
    /// Lax mode - cookie sent with top-level navigations
    Lax,
    /// None mode - cookie sent with all requests (requires Secure)
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Builds a Set-Cookie header value
///
/// # Arguments
/// * `name` - Cookie name
/// * `value` - Cookie value (an empty value with `max_age` 0 clears the cookie)
/// * `max_age` - Lifetime of the cookie
/// * `settings` - Cookie security settings
///
/// # Example
/// ```rust
/// use shiftdesk::config::CookieSettings;
/// use shiftdesk::services::cookies::build_cookie;
///
/// let cookie = build_cookie("accessToken", "abc", chrono::Duration::minutes(15), &CookieSettings::default());
/// assert_eq!(cookie, "accessToken=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=900");
/// ```
pub fn build_cookie(name: &str, value: &str, max_age: Duration, settings: &CookieSettings) -> String {
    format!(
        "{}={}; HttpOnly{}; SameSite={}; Path=/{}; Max-Age={}",
        name,
        value,
        if settings.secure { "; Secure" } else { "" },
        settings.same_site.as_str(),
        settings
            .domain
            .as_deref()
            .map(|domain| format!("; Domain={}", domain))
            .unwrap_or_default(),
        max_age.num_seconds().max(0),
    )
}

/// Set-Cookie value for a session access token
pub fn build_access_token_cookie(token: &str, ttl: Duration, settings: &CookieSettings) -> String {
    build_cookie(ACCESS_TOKEN_COOKIE, token, ttl, settings)
}

/// Set-Cookie value for a session refresh token
pub fn build_refresh_token_cookie(token: &str, ttl: Duration, settings: &CookieSettings) -> String {
    build_cookie(REFRESH_TOKEN_COOKIE, token, ttl, settings)
}

/// Set-Cookie value that expires the named cookie immediately
pub fn build_clear_cookie(name: &str, settings: &CookieSettings) -> String {
    build_cookie(name, "", Duration::zero(), settings)
}

/// Access token from the cookie, else from the `Authorization` header.
///
/// The header may carry the token with or without a `Bearer ` prefix.
pub fn extract_access_token(auth_header: Option<&str>, jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            auth_header
                .and_then(crate::services::jwt::strip_bearer)
                .map(str::to_string)
        })
}

/// Refresh token from the cookie, else from the `x-refresh` header.
pub fn extract_refresh_token(refresh_header: Option<&str>, jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            refresh_header
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_build_access_token_cookie() {
        let settings = CookieSettings {
            secure: true,
            domain: Some("example.com".to_string()),
            same_site: SameSite::Strict,
        };
        let cookie = build_access_token_cookie("tok", Duration::minutes(15), &settings);
        assert_eq!(
            cookie,
            "accessToken=tok; HttpOnly; Secure; SameSite=Strict; Path=/; Domain=example.com; Max-Age=900"
        );
    }

    #[test]
    fn test_build_clear_cookie() {
        let cookie = build_clear_cookie(REFRESH_TOKEN_COOKIE, &CookieSettings::default());
        assert_eq!(cookie, "refreshToken=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    }

    #[test]
    fn test_access_token_sources() {
        let jar = jar_with("accessToken=from-cookie");
        assert_eq!(
            extract_access_token(Some("Bearer from-header"), &jar).as_deref(),
            Some("from-cookie")
        );
        assert_eq!(
            extract_access_token(Some("Bearer from-header"), &CookieJar::new()).as_deref(),
            Some("from-header")
        );
        assert_eq!(
            extract_access_token(Some("Bearer from-header"), &jar_with("accessToken=")).as_deref(),
            Some("from-header")
        );
        assert_eq!(extract_access_token(None, &CookieJar::new()), None);
    }

    #[test]
    fn test_refresh_token_sources() {
        let jar = jar_with("refreshToken=from-cookie");
        assert_eq!(
            extract_refresh_token(Some("from-header"), &jar).as_deref(),
            Some("from-cookie")
        );
        assert_eq!(
            extract_refresh_token(Some("from-header"), &CookieJar::new()).as_deref(),
            Some("from-header")
        );
        assert_eq!(extract_refresh_token(Some("  "), &CookieJar::new()), None);
    }
}
