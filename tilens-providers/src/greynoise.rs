//! GreyNoise client
//!
//! Uses the community endpoint unless the config marks the key as an
//! enterprise key, in which case `full` queries go to the noise context API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use tilens_core::ObservableType;

use crate::client::{endpoint, ensure_supported, require_key, send_json, Reply};
use crate::{GreyNoiseConfig, LookupResult, ProviderError, Severity, ThreatIntelProvider};

const PROVIDER: &str = "GreyNoise";

pub struct GreyNoiseClient {
    http: Client,
    config: GreyNoiseConfig,
}

impl GreyNoiseClient {
    pub fn new(http: Client, config: GreyNoiseConfig) -> Self {
        Self { http, config }
    }

    fn ip_url(&self, ip: &str, query_subtype: Option<&str>) -> Result<String, ProviderError> {
        let base = &self.config.base_url;
        if self.config.enterprise && query_subtype == Some("full") {
            endpoint(base, &["v2", "noise", "context", ip])
        } else {
            endpoint(base, &["v3", "community", ip])
        }
    }
}

fn classify(data: &Value) -> Severity {
    match data["classification"].as_str() {
        Some("malicious") => Severity::High,
        Some("unknown") => Severity::Low,
        Some("benign") => Severity::Information,
        _ => Severity::Unknown,
    }
}

fn summarize(data: &Value) -> Value {
    json!({
        "noise": data["noise"],
        "riot": data["riot"],
        "classification": data["classification"],
        "name": data["name"],
        "last_seen": data["last_seen"],
        "message": data["message"],
    })
}

#[async_trait]
impl ThreatIntelProvider for GreyNoiseClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn supported_types(&self) -> &'static [ObservableType] {
        &[ObservableType::IpAddress]
    }

    async fn lookup(
        &self,
        observable: &str,
        ioc_type: ObservableType,
        query_subtype: Option<&str>,
    ) -> Result<LookupResult, ProviderError> {
        ensure_supported(self, ioc_type)?;
        info!("GreyNoise lookup: {}", observable);

        let mut request = self
            .http
            .get(self.ip_url(observable, query_subtype)?)
            .header("Accept", "application/json");

        // The community API answers without a key at a lower rate limit
        if self.config.enterprise {
            request = request.header("key", require_key(PROVIDER, &self.config.api_key)?);
        } else if let Some(key) = &self.config.api_key {
            request = request.header("key", key);
        }

        let result = match send_json(PROVIDER, request).await? {
            Reply::Found(data) => {
                let severity = classify(&data);
                LookupResult::found(PROVIDER, observable, ioc_type, query_subtype, data.clone())
                    .with_details(summarize(&data))
                    .with_severity(severity)
            }
            Reply::NotFound => LookupResult::not_found(PROVIDER, observable, ioc_type, query_subtype),
        };

        Ok(result.with_reference(format!("https://viz.greynoise.io/ip/{}", observable)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(enterprise: bool) -> GreyNoiseClient {
        GreyNoiseClient::new(
            Client::new(),
            GreyNoiseConfig {
                api_key: Some("k".to_string()),
                base_url: "https://api.greynoise.io/".to_string(),
                enterprise,
            },
        )
    }

    #[test]
    fn test_community_endpoint() {
        assert_eq!(
            client(false).ip_url("1.2.3.4", Some("full")).unwrap(),
            "https://api.greynoise.io/v3/community/1.2.3.4"
        );
    }

    #[test]
    fn test_enterprise_endpoint() {
        assert_eq!(
            client(true).ip_url("1.2.3.4", Some("full")).unwrap(),
            "https://api.greynoise.io/v2/noise/context/1.2.3.4"
        );
        assert!(client(true)
            .ip_url("1.2.3.4", None)
            .unwrap()
            .contains("/v3/community/"));
    }

    #[test]
    fn test_ip_cannot_leave_endpoint() {
        assert_eq!(
            client(false).ip_url("1.2.3.4/../../v2/noise/context/5.6.7.8", None).unwrap(),
            "https://api.greynoise.io/v3/community/1.2.3.4%2F..%2F..%2Fv2%2Fnoise%2Fcontext%2F5.6.7.8"
        );
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify(&json!({"classification": "malicious"})), Severity::High);
        assert_eq!(classify(&json!({"classification": "benign"})), Severity::Information);
        assert_eq!(classify(&json!({})), Severity::Unknown);
    }
}
