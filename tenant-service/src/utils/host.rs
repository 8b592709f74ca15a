use service_core::axum::http::{header::HOST, HeaderMap, Uri};

/// Raw host of a request: the `Host` header, else the URI authority
/// (HTTP/2 requests carry `:authority` instead of `Host`).
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
}
