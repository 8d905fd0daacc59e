//! Access token transport over HTTP
//!
//! Tokens travel in the `Authorization: Bearer` header. Browsers that log in
//! through the API also get the token as an HTTP-only cookie, which is used
//! as a fallback when no header is present.

use axum::http::{HeaderMap, HeaderValue, header};

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Settings for the access token cookie
#[derive(Debug, Clone)]
pub struct TokenCookie {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for TokenCookie {
    fn default() -> Self {
        Self {
            name: ACCESS_TOKEN_COOKIE.to_string(),
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl TokenCookie {
    /// `Set-Cookie` value holding `token` for `max_age_secs`. Always HttpOnly.
    pub fn set_cookie(&self, token: &str, max_age_secs: i64) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.name, token);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!(
            "; SameSite={}; Path={}; Max-Age={}",
            self.same_site.as_str(),
            self.path,
            max_age_secs
        ));
        cookie
    }

    /// `Set-Cookie` value as a header, or `None` if the token contains bytes
    /// a header cannot carry.
    pub fn set_cookie_header(&self, token: &str, max_age_secs: i64) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.set_cookie(token, max_age_secs)).ok()
    }
}

/// Token from `Authorization: Bearer <token>`. The scheme is matched
/// case-insensitively; an empty token counts as absent.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// Bearer header first, then the named cookie.
pub fn extract_access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    extract_bearer(headers)
        .map(str::to_string)
        .or_else(|| extract_cookie(headers, cookie_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(name.clone(), HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_bearer(&h), Some("abc.def.ghi"));

        let h = headers(&[(header::AUTHORIZATION, "bearer abc")]);
        assert_eq!(extract_bearer(&h), Some("abc"));

        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_bearer(&h), None);

        let h = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert_eq!(extract_bearer(&h), None);

        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }

    #[test]
    fn test_extract_cookie() {
        let h = headers(&[(header::COOKIE, "foo=bar; access_token=abc123; other=xyz")]);
        assert_eq!(extract_cookie(&h, "access_token"), Some("abc123".to_string()));
        assert_eq!(extract_cookie(&h, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&h, "missing"), None);
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "access_token=from-cookie"),
        ]);
        assert_eq!(
            extract_access_token(&h, ACCESS_TOKEN_COOKIE),
            Some("from-header".to_string())
        );

        let h = headers(&[(header::COOKIE, "access_token=from-cookie")]);
        assert_eq!(
            extract_access_token(&h, ACCESS_TOKEN_COOKIE),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn test_set_cookie() {
        let cookie = TokenCookie::default().set_cookie("tok", 1800);
        assert!(cookie.starts_with("access_token=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=1800"));

        let insecure = TokenCookie {
            secure: false,
            ..TokenCookie::default()
        };
        assert!(!insecure.set_cookie("tok", 60).contains("Secure"));
    }
}
