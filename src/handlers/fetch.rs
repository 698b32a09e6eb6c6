use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::cache::CachedResponse;
use crate::network::FetchRequest;
use crate::state::AppState;

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = self
            .content_type
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok());

        let mut res = (status, self.body).into_response();
        res.headers_mut().extend(self.headers);
        if let Some(content_type) = content_type {
            res.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        res
    }
}

// Every request the page makes that is not a gateway control route
pub async fn fetch_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = FetchRequest::from_parts(method, &uri, &headers, body);

    match state.gateway.handle_fetch(&request).await {
        Some(res) => res.into_response(),
        // nothing cached, nothing from the network, no shell fallback
        None => StatusCode::GATEWAY_TIMEOUT.into_response(),
    }
}
