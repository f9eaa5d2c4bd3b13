use crate::config::{Provider, VendorConfig};
use crate::error::RelayError;
use crate::vendor::relevance;

const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GROQ_DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Precomputed vendor state used by the relay hot path.
///
/// Endpoint URL, static headers, and credential resolution all happen once at
/// startup; per-request code does no string assembly and no env lookups.
#[derive(Debug, Clone)]
pub struct PreparedVendor {
    name: String,
    provider: Provider,
    endpoint: String,
    endpoint_parsed: Option<url::Url>,
    static_headers: http::HeaderMap,
    api_key_env: String,
    api_key_resolved: bool,
    model: String,
    dataset: String,
}

impl PreparedVendor {
    /// Build a prepared vendor from configuration, resolving the API key from
    /// the process environment.
    #[must_use]
    pub fn new(vendor: &VendorConfig) -> Self {
        let api_key = std::env::var(vendor.api_key_env.trim())
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let base = vendor
            .base_url
            .clone()
            .unwrap_or_else(|| match vendor.provider {
                Provider::Relevance => {
                    relevance::default_base_url(vendor.region.as_deref().unwrap_or_default())
                }
                Provider::Gemini => GEMINI_DEFAULT_BASE_URL.to_string(),
                Provider::Groq => GROQ_DEFAULT_BASE_URL.to_string(),
            });
        let base = base.trim_end_matches('/');

        let model = vendor.model.clone().unwrap_or_default();
        let dataset = vendor.dataset.clone().unwrap_or_default();
        let endpoint = match vendor.provider {
            Provider::Relevance => format!("{base}/embeddings"),
            Provider::Gemini => format!("{base}/models/{model}:generateContent"),
            Provider::Groq => format!("{base}/chat/completions"),
        };
        let endpoint_parsed = url::Url::parse(&endpoint).ok();
        let static_headers = build_vendor_headers(vendor.provider, api_key.as_deref());

        Self {
            name: vendor.name.clone(),
            provider: vendor.provider,
            endpoint,
            endpoint_parsed,
            static_headers,
            api_key_env: vendor.api_key_env.trim().to_string(),
            api_key_resolved: api_key.is_some(),
            model,
            dataset,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    #[must_use]
    pub fn static_headers(&self) -> &http::HeaderMap {
        &self.static_headers
    }

    /// The resolved endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] when the configured base URL did not
    /// parse; this only happens with a hand-built config that skipped
    /// validation.
    pub fn endpoint_url(&self) -> Result<&url::Url, RelayError> {
        self.endpoint_parsed
            .as_ref()
            .ok_or_else(|| RelayError::Config(format!("Invalid endpoint URL: {}", self.endpoint)))
    }

    /// Fail fast when the vendor's API key env var was unset at startup.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingCredentials`]; callers must not attempt
    /// the outbound call in that case.
    pub fn require_credentials(&self) -> Result<(), RelayError> {
        if self.api_key_resolved {
            Ok(())
        } else {
            Err(RelayError::MissingCredentials(format!(
                "environment variable '{}' for vendor '{}' is not set",
                self.api_key_env, self.name
            )))
        }
    }
}

fn build_vendor_headers(provider: Provider, api_key: Option<&str>) -> http::HeaderMap {
    let mut headers = http::HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );

    let Some(key) = api_key else {
        return headers;
    };

    match provider {
        Provider::Relevance => {
            if let Ok(val) = http::HeaderValue::from_str(key) {
                headers.insert(http::header::AUTHORIZATION, val);
            }
        }
        Provider::Gemini => {
            if let Ok(val) = http::HeaderValue::from_str(key) {
                headers.insert("x-goog-api-key", val);
            }
        }
        Provider::Groq => {
            if let Ok(val) = http::HeaderValue::from_str(&format!("Bearer {key}")) {
                headers.insert(http::header::AUTHORIZATION, val);
            }
        }
    }

    headers
}
