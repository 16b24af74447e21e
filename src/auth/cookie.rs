use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "auth-token";

/// Extract a cookie value by name from the `Cookie` request headers
pub fn read_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name.trim() == cookie_name).then(|| value.trim().to_string())
        })
}

/// The session token, if the request carries a non-empty one
pub fn read_session_cookie(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, SESSION_COOKIE).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth-token=abc.def.ghi; lang=en"),
        );
        assert_eq!(read_session_cookie(&headers).as_deref(), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "lang").as_deref(), Some("en"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_session_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("auth-token="));
        assert_eq!(read_session_cookie(&headers), None);
        assert_eq!(read_session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn reads_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("auth-token=xyz"));
        assert_eq!(read_session_cookie(&headers).as_deref(), Some("xyz"));
    }
}
