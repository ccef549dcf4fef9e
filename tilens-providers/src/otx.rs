//! AlienVault OTX client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use tilens_core::ObservableType;

use crate::client::{endpoint, ensure_supported, require_key, send_json, Reply};
use crate::{LookupResult, OtxConfig, ProviderError, Severity, ThreatIntelProvider};

const PROVIDER: &str = "OTX";

const SUPPORTED: &[ObservableType] = &[
    ObservableType::IpAddress,
    ObservableType::Domain,
    ObservableType::Url,
    ObservableType::FileHash,
];

pub struct OtxClient {
    http: Client,
    config: OtxConfig,
}

impl OtxClient {
    pub fn new(http: Client, config: OtxConfig) -> Self {
        Self { http, config }
    }
}

/// Indicator section name for an observable type
fn indicator_kind(kind: ObservableType) -> &'static str {
    match kind {
        ObservableType::IpAddress => "IPv4",
        ObservableType::Domain => "domain",
        ObservableType::Url => "url",
        ObservableType::FileHash => "file",
    }
}

/// Report section for a query subtype. Unrecognized subtypes read `general`.
fn section(query_subtype: Option<&str>) -> &'static str {
    match query_subtype {
        Some("passivedns") => "passive_dns",
        Some("geo") => "geo",
        Some("malware") => "malware",
        Some("url_list") => "url_list",
        _ => "general",
    }
}

fn indicator_url(
    base: &str,
    observable: &str,
    kind: ObservableType,
    query_subtype: Option<&str>,
) -> Result<String, ProviderError> {
    endpoint(
        base,
        &["indicators", indicator_kind(kind), observable, section(query_subtype)],
    )
}

fn summarize(data: &Value) -> (Value, Severity) {
    let pulse_info = &data["pulse_info"];
    let pulse_count = pulse_info["count"].as_u64();
    let pulses: Vec<Value> = pulse_info["pulses"]
        .as_array()
        .map(|p| p.iter().take(5).map(|pulse| pulse["name"].clone()).collect())
        .unwrap_or_default();

    let details = json!({
        "pulse_count": pulse_info["count"],
        "pulse_names": pulses,
        "reputation": data["reputation"],
        "country_name": data["country_name"],
        "asn": data["asn"],
    });

    (details, pulse_count.map(Severity::from_hits).unwrap_or_default())
}

#[async_trait]
impl ThreatIntelProvider for OtxClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn supported_types(&self) -> &'static [ObservableType] {
        SUPPORTED
    }

    async fn lookup(
        &self,
        observable: &str,
        ioc_type: ObservableType,
        query_subtype: Option<&str>,
    ) -> Result<LookupResult, ProviderError> {
        ensure_supported(self, ioc_type)?;
        let key = require_key(PROVIDER, &self.config.api_key)?;
        info!("OTX lookup: {} ({})", observable, ioc_type);

        let url = indicator_url(&self.config.base_url, observable, ioc_type, query_subtype)?;
        let request = self.http.get(url).header("X-OTX-API-KEY", key);

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
            "https://otx.alienvault.com/indicator/{}/{}",
            indicator_kind(ioc_type).to_lowercase(),
            observable
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://otx.alienvault.com/api/v1/";

    #[test]
    fn test_indicator_urls() {
        assert_eq!(
            indicator_url(BASE, "8.8.8.8", ObservableType::IpAddress, Some("full")).unwrap(),
            "https://otx.alienvault.com/api/v1/indicators/IPv4/8.8.8.8/general"
        );
        assert_eq!(
            indicator_url(BASE, "example.com", ObservableType::Domain, Some("passivedns")).unwrap(),
            "https://otx.alienvault.com/api/v1/indicators/domain/example.com/passive_dns"
        );
        assert_eq!(
            indicator_url(BASE, "http://a.b/c?d=1", ObservableType::Url, None).unwrap(),
            "https://otx.alienvault.com/api/v1/indicators/url/http%3A%2F%2Fa.b%2Fc%3Fd%3D1/general"
        );
    }

    #[test]
    fn test_hostile_domain_stays_one_segment() {
        let url = indicator_url(BASE, "a.com/../../users/me#x", ObservableType::Domain, None).unwrap();
        assert_eq!(
            url,
            "https://otx.alienvault.com/api/v1/indicators/domain/a.com%2F..%2F..%2Fusers%2Fme%23x/general"
        );
        assert!(matches!(
            indicator_url(BASE, "..", ObservableType::Domain, None),
            Err(ProviderError::InvalidObservable(_))
        ));
    }

    #[test]
    fn test_pulse_severity() {
        let data = json!({
            "pulse_info": {"count": 3, "pulses": [{"name": "Emotet C2"}, {"name": "Botnet"}]}
        });
        let (details, severity) = summarize(&data);
        assert_eq!(severity, Severity::Medium);
        assert_eq!(details["pulse_names"][0], "Emotet C2");
    }
}
