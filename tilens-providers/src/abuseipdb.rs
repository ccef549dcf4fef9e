//! AbuseIPDB v2 client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use tilens_core::ObservableType;

use crate::client::{ensure_supported, require_key, send_json, Reply};
use crate::{AbuseIpdbConfig, LookupResult, ProviderError, Severity, ThreatIntelProvider};

const PROVIDER: &str = "AbuseIPDB";

pub struct AbuseIpdbClient {
    http: Client,
    config: AbuseIpdbConfig,
}

impl AbuseIpdbClient {
    pub fn new(http: Client, config: AbuseIpdbConfig) -> Self {
        Self { http, config }
    }
}

fn summarize(data: &Value) -> (Value, Severity) {
    let report = &data["data"];
    let score = report["abuseConfidenceScore"].as_u64();
    let details = json!({
        "abuseConfidenceScore": report["abuseConfidenceScore"],
        "isWhitelisted": report["isWhitelisted"],
        "countryCode": report["countryCode"],
        "usageType": report["usageType"],
        "isp": report["isp"],
        "domain": report["domain"],
        "totalReports": report["totalReports"],
        "lastReportedAt": report["lastReportedAt"],
    });
    (details, score.map(Severity::from_score).unwrap_or_default())
}

#[async_trait]
impl ThreatIntelProvider for AbuseIpdbClient {
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
        let key = require_key(PROVIDER, &self.config.api_key)?;
        info!("AbuseIPDB lookup: {}", observable);

        let max_age = self.config.max_age_days.to_string();
        let request = self
            .http
            .get(format!("{}/check", self.config.base_url.trim_end_matches('/')))
            .header("Key", key)
            .header("Accept", "application/json")
            .query(&[
                ("ipAddress", observable),
                ("maxAgeInDays", max_age.as_str()),
                ("verbose", ""),
            ]);

        let result = match send_json(PROVIDER, request).await? {
            Reply::Found(data) => {
                let (details, severity) = summarize(&data);
                LookupResult::found(PROVIDER, observable, ioc_type, query_subtype, data)
                    .with_details(details)
                    .with_severity(severity)
            }
            Reply::NotFound => LookupResult::not_found(PROVIDER, observable, ioc_type, query_subtype),
        };

        Ok(result.with_reference(format!("https://www.abuseipdb.com/check/{}", observable)))
    }
}
