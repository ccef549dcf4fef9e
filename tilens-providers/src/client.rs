//! Shared HTTP plumbing and the provider interface

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use tilens_core::ObservableType;

use crate::{LookupResult, ProviderConfig};

/// Errors from provider lookups
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("No credentials configured for {0}")]
    MissingCredentials(&'static str),

    #[error("{provider} does not support {ioc_type} lookups")]
    Unsupported {
        provider: &'static str,
        ioc_type: ObservableType,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Observable cannot be used in a request path: {0:?}")]
    InvalidObservable(String),
}

/// A threat-intelligence service that can be queried for an observable
#[async_trait]
pub trait ThreatIntelProvider: Send + Sync {
    /// Provider name as shown in results
    fn name(&self) -> &'static str;

    /// Observable types this provider answers for
    fn supported_types(&self) -> &'static [ObservableType];

    fn supports(&self, ioc_type: ObservableType) -> bool {
        self.supported_types().contains(&ioc_type)
    }

    /// Look up one observable. `query_subtype` selects a provider specific
    /// report section (e.g. `full`, `passivedns`, `geo`).
    async fn lookup(
        &self,
        observable: &str,
        ioc_type: ObservableType,
        query_subtype: Option<&str>,
    ) -> Result<LookupResult, ProviderError>;
}

/// Create the HTTP client shared by the provider clients
pub fn create_http_client(config: &ProviderConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("tilens/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::ClientBuild(e.to_string()))
}

/// `base` followed by each segment, percent-encoded.
///
/// Segments are model-written, so `/`, `?` and `#` stay inside their
/// segment and dot segments are refused.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<String, ProviderError> {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        if matches!(*segment, "" | "." | "..") {
            return Err(ProviderError::InvalidObservable(segment.to_string()));
        }
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    Ok(url)
}

/// Body of a provider reply. 404 is an answer ("not known"), not a failure.
#[derive(Debug)]
pub(crate) enum Reply {
    Found(Value),
    NotFound,
}

/// Send a request and decode the JSON body
pub(crate) async fn send_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Reply, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    debug!("{} responded with {}", provider, status);

    if status == StatusCode::NOT_FOUND {
        return Ok(Reply::NotFound);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map(Reply::Found)
        .map_err(|e| ProviderError::Decode {
            provider,
            message: e.to_string(),
        })
}

/// Fail early when a provider cannot answer for this observable type
pub(crate) fn ensure_supported(
    provider: &dyn ThreatIntelProvider,
    ioc_type: ObservableType,
) -> Result<(), ProviderError> {
    if provider.supports(ioc_type) {
        Ok(())
    } else {
        Err(ProviderError::Unsupported {
            provider: provider.name(),
            ioc_type,
        })
    }
}

/// Pull a required credential out of the config
pub(crate) fn require_key<'a>(
    provider: &'static str,
    key: &'a Option<String>,
) -> Result<&'a str, ProviderError> {
    key.as_deref()
        .ok_or(ProviderError::MissingCredentials(provider))
}
