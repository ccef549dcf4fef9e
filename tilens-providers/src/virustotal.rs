//! VirusTotal v3 client
//!
//! Besides plain IOC reports, VirusTotal can return whole objects by id and
//! walk relationships (samples that talk to or were downloaded from a host).

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::info;

use tilens_core::{ObservableType, RelationshipKind};

use crate::client::{endpoint, ensure_supported, require_key, send_json, Reply};
use crate::{
    LookupResult, ProviderError, RelatedObject, RelationshipResult, Severity, ThreatIntelProvider,
    VirusTotalConfig,
};

const PROVIDER: &str = "VirusTotal";

const SUPPORTED: &[ObservableType] = &[
    ObservableType::IpAddress,
    ObservableType::Domain,
    ObservableType::Url,
    ObservableType::FileHash,
];

/// The VirusTotal-specific capabilities used by the VT agent
#[async_trait]
pub trait VirusTotalApi: Send + Sync {
    /// Report for an IP, domain, URL or file hash
    async fn lookup_ioc(
        &self,
        observable: &str,
        vt_type: ObservableType,
    ) -> Result<LookupResult, ProviderError>;

    /// Fetch a single object by id
    async fn get_object(&self, id: &str, kind: ObservableType) -> Result<LookupResult, ProviderError>;

    /// Related samples of a network observable
    async fn lookup_ioc_relationships(
        &self,
        observable: &str,
        vt_type: ObservableType,
        relationship: RelationshipKind,
        limit: u32,
    ) -> Result<RelationshipResult, ProviderError>;
}

/// API collection name for an observable type
fn collection(kind: ObservableType) -> &'static str {
    match kind {
        ObservableType::IpAddress => "ip_addresses",
        ObservableType::Domain => "domains",
        ObservableType::Url => "urls",
        ObservableType::FileHash => "files",
    }
}

/// Object id as VirusTotal expects it; URLs are referenced by their
/// unpadded URL-safe base64 form.
fn object_id(observable: &str, kind: ObservableType) -> String {
    match kind {
        ObservableType::Url => URL_SAFE_NO_PAD.encode(observable),
        _ => observable.to_string(),
    }
}

fn gui_reference(observable: &str, kind: ObservableType) -> String {
    let section = match kind {
        ObservableType::IpAddress => "ip-address",
        ObservableType::Domain => "domain",
        ObservableType::Url => "url",
        ObservableType::FileHash => "file",
    };
    format!(
        "https://www.virustotal.com/gui/{}/{}",
        section,
        object_id(observable, kind)
    )
}

/// Summarize `last_analysis_stats` and reputation into details and severity
fn summarize(data: &Value) -> (Value, Severity) {
    let attributes = &data["data"]["attributes"];
    let stats = &attributes["last_analysis_stats"];
    let malicious = stats["malicious"].as_u64().unwrap_or(0);
    let suspicious = stats["suspicious"].as_u64().unwrap_or(0);

    let severity = if stats.is_null() {
        Severity::Unknown
    } else if malicious > 0 {
        Severity::from_hits(malicious).max(Severity::Medium)
    } else if suspicious > 0 {
        Severity::Low
    } else {
        Severity::Information
    };

    let details = json!({
        "last_analysis_stats": stats,
        "reputation": attributes["reputation"],
        "tags": attributes["tags"],
        "last_analysis_date": attributes["last_analysis_date"],
    });

    (details, severity)
}

/// VirusTotal v3 REST client
pub struct VirusTotalClient {
    http: Client,
    config: VirusTotalConfig,
}

impl VirusTotalClient {
    pub fn new(http: Client, config: VirusTotalConfig) -> Self {
        Self { http, config }
    }

    /// Authenticated GET for `segments` below the API base
    fn request(&self, segments: &[&str]) -> Result<RequestBuilder, ProviderError> {
        let key = require_key(PROVIDER, &self.config.api_key)?;
        let url = endpoint(&self.config.base_url, segments)?;
        Ok(self
            .http
            .get(url)
            .header("x-apikey", key)
            .header("Accept", "application/json"))
    }

    fn relationships_request(
        &self,
        observable: &str,
        vt_type: ObservableType,
        relationship: RelationshipKind,
        limit: u32,
    ) -> Result<RequestBuilder, ProviderError> {
        let id = object_id(observable, vt_type);
        let request = self.request(&[collection(vt_type), &id, relationship.as_str()])?;
        Ok(request.query(&[("limit", limit)]))
    }

    async fn report(
        &self,
        observable: &str,
        kind: ObservableType,
    ) -> Result<LookupResult, ProviderError> {
        ensure_supported(self, kind)?;
        let id = object_id(observable, kind);
        let request = self.request(&[collection(kind), &id])?;

        let result = match send_json(PROVIDER, request).await? {
            Reply::Found(data) => {
                let (details, severity) = summarize(&data);
                LookupResult::found(PROVIDER, observable, kind, None, data)
                    .with_details(details)
                    .with_severity(severity)
            }
            Reply::NotFound => LookupResult::not_found(PROVIDER, observable, kind, None),
        };

        Ok(result.with_reference(gui_reference(observable, kind)))
    }
}

#[async_trait]
impl VirusTotalApi for VirusTotalClient {
    async fn lookup_ioc(
        &self,
        observable: &str,
        vt_type: ObservableType,
    ) -> Result<LookupResult, ProviderError> {
        info!("VirusTotal lookup: {} ({})", observable, vt_type);
        self.report(observable, vt_type).await
    }

    async fn get_object(&self, id: &str, kind: ObservableType) -> Result<LookupResult, ProviderError> {
        info!("VirusTotal object: {} ({})", id, kind);
        self.report(id, kind).await
    }

    async fn lookup_ioc_relationships(
        &self,
        observable: &str,
        vt_type: ObservableType,
        relationship: RelationshipKind,
        limit: u32,
    ) -> Result<RelationshipResult, ProviderError> {
        if vt_type == ObservableType::FileHash {
            return Err(ProviderError::Unsupported {
                provider: PROVIDER,
                ioc_type: vt_type,
            });
        }

        info!(
            "VirusTotal relationships: {} ({}) -> {}",
            observable, vt_type, relationship
        );

        let request = self.relationships_request(observable, vt_type, relationship, limit)?;

        let objects = match send_json(PROVIDER, request).await? {
            Reply::Found(data) => parse_related(&data),
            Reply::NotFound => Vec::new(),
        };

        Ok(RelationshipResult {
            source: observable.to_string(),
            source_type: vt_type,
            relationship,
            objects,
        })
    }
}

#[async_trait]
impl ThreatIntelProvider for VirusTotalClient {
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
        _query_subtype: Option<&str>,
    ) -> Result<LookupResult, ProviderError> {
        self.lookup_ioc(observable, ioc_type).await
    }
}

fn parse_related(data: &Value) -> Vec<RelatedObject> {
    data["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(RelatedObject {
                        target: item["id"].as_str()?.to_string(),
                        target_type: item["type"].as_str().unwrap_or("file").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
