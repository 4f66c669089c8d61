// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::http::HeaderMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestTrace {
    pub request_id: String,
}

#[must_use]
pub(crate) fn extract_request_trace(headers: &HeaderMap, state: &AppState) -> RequestTrace {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| {
            let id = state
                .request_id_seed
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            format!("req-{id:016x}")
        });

    RequestTrace { request_id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};
    use campus_checkin_store::InMemoryLedger;
    use std::sync::Arc;

    #[test]
    fn echoes_or_generates_request_id() {
        let state = crate::AppState::new(Arc::new(InMemoryLedger::default()));

        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req-abc"));
        assert_eq!(extract_request_trace(&headers, &state).request_id, "req-abc");

        let first = extract_request_trace(&HeaderMap::new(), &state);
        let second = extract_request_trace(&HeaderMap::new(), &state);
        assert_eq!(first.request_id, "req-0000000000000001");
        assert_ne!(first.request_id, second.request_id);
    }
}
