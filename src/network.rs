use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, Method, Uri, header};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cache::CachedResponse;
use crate::error::{GatewayError, Result};

// Page request headers passed on to the upstream
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 6] = [
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::AUTHORIZATION,
    header::COOKIE,
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
];

// Upstream response headers kept next to the body (content-type is stored separately)
pub const KEPT_RESPONSE_HEADERS: [HeaderName; 4] = [
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CONTENT_LANGUAGE,
];

// Copies only the allowlisted headers
pub fn retain_headers(headers: &HeaderMap, allowed: &[HeaderName]) -> HeaderMap {
    let mut kept = HeaderMap::new();
    for name in allowed {
        for value in headers.get_all(name) {
            kept.append(name.clone(), value.clone());
        }
    }
    kept
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Other,
}

// An intercepted page request, reduced to what the strategies look at
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub method: Method,
    pub path: String, // path + query, also the cache key
    pub mode: RequestMode,
    pub content_type: Option<String>,
    pub headers: HeaderMap, // forwarded request headers only
    pub body: Bytes,
}

impl FetchRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            mode: RequestMode::Other,
            content_type: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[cfg(test)]
    pub fn navigate(path: &str) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(path)
        }
    }

    pub fn from_parts(method: Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> Self {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let mode = if is_navigation(&method, headers) {
            RequestMode::Navigate
        } else {
            RequestMode::Other
        };

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            method,
            path,
            mode,
            content_type,
            headers: retain_headers(headers, &FORWARDED_REQUEST_HEADERS),
            body,
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

// Browsers send Sec-Fetch-Mode; older clients only tell us they want HTML
fn is_navigation(method: &Method, headers: &HeaderMap) -> bool {
    if method != Method::GET {
        return false;
    }
    if let Some(mode) = headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) {
        return mode.eq_ignore_ascii_case("navigate");
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.starts_with("text/html"))
        .unwrap_or(false)
}

/// The network side of the gateway. `Err` means the request never produced a
/// response; an HTTP error status is still `Ok`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse>;
}

// Upstream origin serving the app shell, audio and the prayer-times API
pub struct UpstreamClient {
    client: reqwest::Client,
    pub base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        // add http:// if not present
        let base_url = if trimmed.starts_with("http") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Fetcher for UpstreamClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| GatewayError::Offline(format!("invalid method: {}", e)))?;

        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, request.path));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        if !request.body.is_empty() {
            if let Some(content_type) = &request.content_type {
                builder = builder.header("content-type", content_type.as_str());
            }
            builder = builder.body(request.body.clone());
        }

        let res = builder.send().await?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let headers = upstream_headers(res.headers());
        let body = res.bytes().await?;

        Ok(CachedResponse {
            status,
            content_type,
            headers,
            body,
        })
    }
}

// KEPT_RESPONSE_HEADERS picked out of a reqwest response
fn upstream_headers(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut kept = HeaderMap::new();
    for name in &KEPT_RESPONSE_HEADERS {
        for value in headers.get_all(name.as_str()) {
            if let Ok(value) = axum::http::HeaderValue::from_bytes(value.as_bytes()) {
                kept.append(name.clone(), value);
            }
        }
    }
    kept
}

/// Last known reachability of the upstream.
pub struct Connectivity {
    online: AtomicBool,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    // Returns the previous value
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::Relaxed)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn sec_fetch_mode_marks_navigation() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        let uri: Uri = "/quran?surah=1".parse().unwrap();
        let req = FetchRequest::from_parts(Method::GET, &uri, &headers, Bytes::new());
        assert!(req.is_navigation());
        assert_eq!(req.path, "/quran?surah=1");
    }

    #[test]
    fn html_accept_without_fetch_metadata_is_navigation() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        let uri: Uri = "/".parse().unwrap();
        assert!(FetchRequest::from_parts(Method::GET, &uri, &headers, Bytes::new()).is_navigation());
    }

    #[test]
    fn subresource_requests_are_not_navigation() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        let uri: Uri = "/manifest.json".parse().unwrap();
        assert!(!FetchRequest::from_parts(Method::GET, &uri, &headers, Bytes::new()).is_navigation());
        assert!(
            !FetchRequest::from_parts(Method::POST, &uri, &HeaderMap::new(), Bytes::new())
                .is_navigation()
        );
    }

    #[test]
    fn only_allowlisted_request_headers_are_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ar"));
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(header::HOST, HeaderValue::from_static("gateway:8080"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        let uri: Uri = "/api/prayer-times/2026-10-16".parse().unwrap();

        let req = FetchRequest::from_parts(Method::GET, &uri, &headers, Bytes::new());
        assert_eq!(req.headers.len(), 3);
        assert_eq!(req.headers[header::ACCEPT_LANGUAGE], "ar");
        assert_eq!(req.headers[header::IF_NONE_MATCH], "\"abc\"");
        assert_eq!(req.headers[header::AUTHORIZATION], "Bearer t");
        assert!(req.headers.get(header::HOST).is_none());
        assert!(req.headers.get("x-forwarded-for").is_none());
    }

    #[test]
    fn retain_headers_keeps_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("public"));
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("session=1"));

        let kept = retain_headers(&headers, &KEPT_RESPONSE_HEADERS);
        assert_eq!(kept.get_all(header::CACHE_CONTROL).iter().count(), 2);
        assert!(kept.get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn upstream_url_gets_scheme() {
        let client = UpstreamClient::new("localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn connectivity_reports_previous_state() {
        let connectivity = Connectivity::new(false);
        assert!(!connectivity.set_online(true));
        assert!(connectivity.is_online());
    }
}
