//! AbuseIPDB agent

use std::sync::Arc;

use tilens_core::ObservableType;
use tilens_providers::ThreatIntelProvider;

use crate::{lookup_truncated, AgentError, LookupAgent, Tool};

/// Agent backed by AbuseIPDB
#[derive(Clone)]
pub struct AbuseIpdbAgent {
    provider: Arc<dyn ThreatIntelProvider>,
}

impl AbuseIpdbAgent {
    pub fn new(provider: Arc<dyn ThreatIntelProvider>) -> Self {
        Self { provider }
    }

    /// Full abuse report for an IPv4 address
    pub async fn ip_info(&self, ip_address: &str) -> Result<String, AgentError> {
        lookup_truncated(
            self.provider.as_ref(),
            ip_address,
            ObservableType::IpAddress,
            Some("full"),
        )
        .await
    }
}

impl LookupAgent for AbuseIpdbAgent {
    fn name(&self) -> &str {
        "AbuseIPDBAgent"
    }

    fn tools(&self) -> Vec<Tool> {
        let agent = self.clone();
        vec![Tool::new(
            "Retrieve_IP_Info",
            "Useful when you need to look up threat intelligence information for an IP address.",
            move |input| {
                let agent = agent.clone();
                async move { agent.ip_info(&input).await }
            },
        )]
    }
}
