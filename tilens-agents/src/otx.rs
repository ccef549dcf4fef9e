//! AlienVault OTX agent
//!
//! The only agent covering all four observable types.

use std::sync::Arc;

use tilens_core::ObservableType;
use tilens_providers::ThreatIntelProvider;

use crate::{lookup_truncated, AgentError, LookupAgent, Tool};

/// Agent backed by AlienVault OTX
#[derive(Clone)]
pub struct OtxAgent {
    provider: Arc<dyn ThreatIntelProvider>,
}

impl OtxAgent {
    pub fn new(provider: Arc<dyn ThreatIntelProvider>) -> Self {
        Self { provider }
    }

    // TODO: pick ipv6 / passivedns / geo sections from the observable and prompt
    pub async fn ip_info(&self, ip_address: &str) -> Result<String, AgentError> {
        lookup_truncated(
            self.provider.as_ref(),
            ip_address,
            ObservableType::IpAddress,
            Some("full"),
        )
        .await
    }

    pub async fn domain_info(&self, domain: &str) -> Result<String, AgentError> {
        lookup_truncated(self.provider.as_ref(), domain, ObservableType::Domain, None).await
    }

    pub async fn url_info(&self, url: &str) -> Result<String, AgentError> {
        lookup_truncated(self.provider.as_ref(), url, ObservableType::Url, None).await
    }

    pub async fn samples_info(&self, hash: &str) -> Result<String, AgentError> {
        lookup_truncated(self.provider.as_ref(), hash, ObservableType::FileHash, None).await
    }
}

impl LookupAgent for OtxAgent {
    fn name(&self) -> &str {
        "OTXAgent"
    }

    fn tools(&self) -> Vec<Tool> {
        let (ip, domain, url, sample) = (self.clone(), self.clone(), self.clone(), self.clone());

        vec![
            Tool::new(
                "Retrieve_IP_OTX_Info",
                "Useful when you need to look up threat intelligence information for an IP address.",
                move |input| {
                    let agent = ip.clone();
                    async move { agent.ip_info(&input).await }
                },
            ),
            Tool::new(
                "Retrieve_Domain_OTX_Info",
                "Useful when you need to look up threat intelligence information for a domain.",
                move |input| {
                    let agent = domain.clone();
                    async move { agent.domain_info(&input).await }
                },
            ),
            Tool::new(
                "Retrieve_url_OTX_Info",
                "Useful when you need to look up threat intelligence information for an url.",
                move |input| {
                    let agent = url.clone();
                    async move { agent.url_info(&input).await }
                },
            ),
            Tool::new(
                "Retrieve_Sample_OTX_information",
                "Useful when you need to obtain more details about a sample.",
                move |input| {
                    let agent = sample.clone();
                    async move { agent.samples_info(&input).await }
                },
            ),
        ]
    }
}
