use std::sync::Arc;
use std::time::Instant;

use axum::response::{IntoResponse, Json, Response};

use crate::error::RelayError;
use crate::observability::log_relay_complete;
use crate::state::AppState;

use super::{relay_message, ChatRequest};

/// Handler shared by `POST /chat` and its `POST /query` alias.
pub async fn handler(state: Arc<AppState>, body: bytes::Bytes) -> Response {
    let request_id = state.next_request_id();
    let started = Instant::now();

    let parsed = serde_json::from_slice::<ChatRequest>(&body)
        .map_err(|err| RelayError::InvalidRequest(format!("malformed JSON body: {err}")));

    let (response, vendor_label, provider_label, status) = match parsed {
        Ok(request) => match relay_message(state.as_ref(), &request).await {
            Ok((reply, vendor)) => {
                let vendor_name = vendor.name().to_string();
                let provider = vendor.provider().to_string();
                (Json(reply).into_response(), vendor_name, provider, 200)
            }
            Err(err) => {
                let status = err.status().as_u16();
                tracing::warn!(request_id = %request_id, error = %err, "relay failed");
                let vendor_name = request
                    .vendor
                    .unwrap_or_else(|| state.default_vendor_name().to_string());
                (err.into_response(), vendor_name, "-".to_string(), status)
            }
        },
        Err(err) => {
            let status = err.status().as_u16();
            (err.into_response(), "-".to_string(), "-".to_string(), status)
        }
    };

    log_relay_complete(
        request_id,
        &vendor_label,
        &provider_label,
        status,
        started.elapsed(),
    );
    response
}
