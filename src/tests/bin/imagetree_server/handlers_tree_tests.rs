use super::*;

use axum::http::HeaderValue;

fn with_if_match(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::IF_MATCH, HeaderValue::from_static(value));
    headers
}

#[test]
fn if_match_accepts_quoted_weak_and_bare_versions() {
    assert_eq!(if_match_version(&HeaderMap::new()).expect("no header"), None);
    assert_eq!(
        if_match_version(&with_if_match("\"abc\"")).expect("quoted"),
        Some("abc".to_string())
    );
    assert_eq!(
        if_match_version(&with_if_match("W/\"abc\"")).expect("weak"),
        Some("abc".to_string())
    );
    assert_eq!(
        if_match_version(&with_if_match("abc")).expect("bare"),
        Some("abc".to_string())
    );
}

#[test]
fn if_match_wildcard_means_unconditional() {
    assert_eq!(if_match_version(&with_if_match("*")).expect("wildcard"), None);
}
