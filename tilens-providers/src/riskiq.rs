//! RiskIQ PassiveTotal client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use tilens_core::ObservableType;

use crate::client::{ensure_supported, require_key, send_json, Reply};
use crate::{LookupResult, ProviderError, RiskIqConfig, Severity, ThreatIntelProvider};

const PROVIDER: &str = "RiskIQ";

pub struct RiskIqClient {
    http: Client,
    config: RiskIqConfig,
}

impl RiskIqClient {
    pub fn new(http: Client, config: RiskIqConfig) -> Self {
        Self { http, config }
    }
}

/// Counts from the summary card. Malware hashes and articles tied to the
/// host drive severity; the netblock is reported as-is.
fn summarize(data: &Value) -> (Value, Severity) {
    let summary = &data["data_summary"];
    let articles = summary["articles"]["count"].as_u64().unwrap_or(0);
    let malware_hashes = summary["hashes"]["count"].as_u64().unwrap_or(0);
    let details = json!({
        "netblock": data["netblock"],
        "organization": data["organization"],
        "asn": data["asn"],
        "hosting_provider": data["hosting_provider"],
        "resolutions": summary["resolutions"]["count"],
        "certificates": summary["certificates"]["count"],
        "articles": articles,
        "malware_hashes": malware_hashes,
        "projects": summary["projects"]["count"],
    });

    let severity = if summary.is_null() {
        Severity::Unknown
    } else {
        Severity::from_hits(articles + malware_hashes)
    };

    (details, severity)
}

#[async_trait]
impl ThreatIntelProvider for RiskIqClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn supported_types(&self) -> &'static [ObservableType] {
        &[ObservableType::IpAddress, ObservableType::Domain]
    }

    async fn lookup(
        &self,
        observable: &str,
        ioc_type: ObservableType,
        query_subtype: Option<&str>,
    ) -> Result<LookupResult, ProviderError> {
        ensure_supported(self, ioc_type)?;
        let username = require_key(PROVIDER, &self.config.username)?;
        let key = require_key(PROVIDER, &self.config.api_key)?;
        info!("RiskIQ lookup: {} ({})", observable, ioc_type);

        let request = self
            .http
            .get(format!(
                "{}/v2/cards/summary",
                self.config.base_url.trim_end_matches('/')
            ))
            .basic_auth(username, Some(key))
            .query(&[("query", observable)]);

        let result = match send_json(PROVIDER, request).await? {
            Reply::Found(data) => {
                let (details, severity) = summarize(&data);
                LookupResult::found(PROVIDER, observable, ioc_type, query_subtype, data)
                    .with_details(details)
                    .with_severity(severity)
            }
            Reply::NotFound => LookupResult::not_found(PROVIDER, observable, ioc_type, query_subtype),
        };

        Ok(result.with_reference(format!(
            "https://community.riskiq.com/search/{}",
            observable
        )))
    }
}
