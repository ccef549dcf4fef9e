//! GreyNoise agent

use std::sync::Arc;

use tilens_core::ObservableType;
use tilens_providers::ThreatIntelProvider;

use crate::{lookup_truncated, AgentError, LookupAgent, Tool};

/// Agent backed by GreyNoise
#[derive(Clone)]
pub struct GreyNoiseAgent {
    provider: Arc<dyn ThreatIntelProvider>,
}

impl GreyNoiseAgent {
    pub fn new(provider: Arc<dyn ThreatIntelProvider>) -> Self {
        Self { provider }
    }

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

impl LookupAgent for GreyNoiseAgent {
    fn name(&self) -> &str {
        "GreyNoiseAgent"
    }

    fn tools(&self) -> Vec<Tool> {
        let agent = self.clone();
        vec![Tool::new(
            "Retrieve_IP_greynoise_Info",
            "Useful when you need to look up threat intelligence information for an IP address.",
            move |input| {
                let agent = agent.clone();
                async move { agent.ip_info(&input).await }
            },
        )]
    }
}
