//! RiskIQ agent

use std::sync::Arc;

use tilens_core::ObservableType;
use tilens_providers::ThreatIntelProvider;

use crate::{lookup_truncated, AgentError, LookupAgent, Tool};

/// Agent backed by RiskIQ PassiveTotal
#[derive(Clone)]
pub struct RiskIqAgent {
    provider: Arc<dyn ThreatIntelProvider>,
}

impl RiskIqAgent {
    pub fn new(provider: Arc<dyn ThreatIntelProvider>) -> Self {
        Self { provider }
    }

    pub async fn ip_info(&self, ip_address: &str) -> Result<String, AgentError> {
        lookup_truncated(self.provider.as_ref(), ip_address, ObservableType::IpAddress, None).await
    }

    pub async fn domain_info(&self, domain: &str) -> Result<String, AgentError> {
        lookup_truncated(self.provider.as_ref(), domain, ObservableType::Domain, None).await
    }
}

impl LookupAgent for RiskIqAgent {
    fn name(&self) -> &str {
        "RiskIQAgent"
    }

    fn tools(&self) -> Vec<Tool> {
        let (ip, domain) = (self.clone(), self.clone());

        vec![
            Tool::new(
                "Retrieve_IP_Info",
                "Useful when you need to look up threat intelligence information for an IP address.",
                move |input| {
                    let agent = ip.clone();
                    async move { agent.ip_info(&input).await }
                },
            ),
            Tool::new(
                "Retrieve_Domain_Info",
                "Useful when you need to look up threat intelligence information for a domain or a hostname.",
                move |input| {
                    let agent = domain.clone();
                    async move { agent.domain_info(&input).await }
                },
            ),
        ]
    }
}
