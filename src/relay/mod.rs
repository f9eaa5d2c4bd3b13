pub mod chat;
pub mod health;

use serde::{Deserialize, Serialize};

use crate::config::Provider;
use crate::error::{sanitize_upstream_error, RelayError};
use crate::state::AppState;
use crate::transport::PreparedVendor;
use crate::vendor::{self, gemini, groq, relevance};

/// Inbound chat payload.
///
/// `vendor` optionally names a configured relay target; when absent the
/// default vendor handles the message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// Outbound chat payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Relay one chat message to its vendor and return the extracted reply.
///
/// One synchronous round trip: encode the vendor payload, send it once, and
/// classify whatever comes back. No retries and no fallback vendor.
///
/// # Errors
///
/// - [`RelayError::InvalidRequest`] for an empty message or unknown vendor.
/// - [`RelayError::MissingCredentials`] when the vendor's key env var is
///   unset; the outbound call is never attempted.
/// - [`RelayError::Upstream`] for a non-2xx vendor response.
/// - [`RelayError::Transport`] / [`RelayError::Decode`] for IO and shape
///   failures.
pub async fn relay_message<'a>(
    state: &'a AppState,
    request: &ChatRequest,
) -> Result<(ChatReply, &'a PreparedVendor), RelayError> {
    if request.message.trim().is_empty() {
        return Err(RelayError::InvalidRequest(
            "No message provided".to_string(),
        ));
    }

    let vendor = state.resolve_vendor(request.vendor.as_deref())?;
    vendor.require_credentials()?;

    let upstream_body = encode_for_vendor(vendor, &request.message)?;
    let url = vendor.endpoint_url()?;
    let response = state
        .transport
        .send(url, vendor.static_headers(), upstream_body)
        .await?;

    let status = response.status();
    let body_bytes = response
        .bytes()
        .await
        .map_err(|err| RelayError::Transport(err.to_string()))?;

    if !status.is_success() {
        return Err(RelayError::Upstream {
            status: status.as_u16(),
            message: sanitize_upstream_error(&body_bytes),
        });
    }

    let reply = vendor::decode_reply(vendor.provider(), &body_bytes)?;
    Ok((ChatReply { reply }, vendor))
}

fn encode_for_vendor(
    vendor: &PreparedVendor,
    message: &str,
) -> Result<bytes::Bytes, RelayError> {
    match vendor.provider() {
        Provider::Relevance => relevance::encode_embed_request(vendor.dataset(), message),
        Provider::Gemini => gemini::encode_generate_request(message),
        Provider::Groq => groq::encode_chat_request(vendor.model(), message),
    }
}
