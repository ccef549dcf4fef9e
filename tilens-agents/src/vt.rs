//! VirusTotal agent
//!
//! Three tools: a report for an IP/domain/URL, a report for a sample hash,
//! and the samples related to a network observable. The first and last take
//! comma separated arguments; their descriptions tell the model the format.

use std::sync::Arc;

use tilens_core::{
    parse_observable_pair, parse_relationship_triple, truncate, ObservableType, RelationshipKind,
};
use tilens_providers::{VirusTotalApi, VirusTotalClient};

use crate::{AgentError, LookupAgent, Tool};

/// Related samples fetched per relationship query
pub const RELATIONSHIP_LIMIT: u32 = 10;

const URL_IP_DOMAIN_DESCRIPTION: &str = "Useful when you need to look up threat intelligence information for an url, ip or a domain. if it is an ip, the observable_type should be 'ip_address', if it is a domain, the observable_type should be 'domain' and if it is an url, the observable_type should be 'url'. The input to this tool should be a comma separated list that contains an observable (IP or domain, or url) and observable_type that can be 'ip_address', 'domain' or 'url'. For example, 8.8.8.8,ip_address would be the input to retrieve the info about the ip 8.8.8.8 ";

const SAMPLE_DESCRIPTION: &str = "Useful when you need to obtain more details about a sample. A sample must be specified by its hash.";

const RELATIONSHIPS_DESCRIPTION: &str = "Useful when you need to get communicating_samples or donwloaded_samples from an IP, an url or a domain. The input to this tool should be a comma separated list that contains an observable (IP or domain, or url) and observable_type that can be 'ip_address', 'domain' or 'url' and the relationship that can be 'communicating_files' or 'downloaded_files'. For example, 8.8.8.8,ip_address,communicating_files would be the input to retrieve the communicating files from 8.8.8.8";

/// Agent backed by VirusTotal
#[derive(Clone)]
pub struct VtAgent {
    client: Arc<dyn VirusTotalApi>,
}

impl VtAgent {
    pub fn new(client: Arc<dyn VirusTotalApi>) -> Self {
        Self { client }
    }

    pub fn from_client(client: VirusTotalClient) -> Self {
        Self::new(Arc::new(client))
    }

    /// Report for an IP, domain or URL, cut to the output budget
    pub async fn url_ip_domain_info(
        &self,
        observable: &str,
        observable_type: &str,
    ) -> Result<String, AgentError> {
        let vt_type: ObservableType = observable_type.parse()?;
        let result = self.client.lookup_ioc(observable, vt_type).await?;
        Ok(truncate(&result.to_string()))
    }

    /// Report for a sample hash, cut to the output budget
    pub async fn samples_info(&self, hash: &str) -> Result<String, AgentError> {
        let result = self.client.get_object(hash, ObservableType::FileHash).await?;
        Ok(truncate(&result.to_string()))
    }

    /// Samples related to a network observable. Not truncated.
    pub async fn relationships(
        &self,
        observable: &str,
        observable_type: &str,
        relationship: &str,
    ) -> Result<String, AgentError> {
        let vt_type: ObservableType = observable_type.parse()?;
        let relationship: RelationshipKind = relationship.parse()?;
        let result = self
            .client
            .lookup_ioc_relationships(observable, vt_type, relationship, RELATIONSHIP_LIMIT)
            .await?;
        Ok(result.to_string())
    }

    /// Tool entry point for `observable,observable_type`
    pub async fn info_from_input(&self, input: &str) -> Result<String, AgentError> {
        let (observable, observable_type) = parse_observable_pair(input)?;
        self.url_ip_domain_info(observable, observable_type).await
    }

    /// Tool entry point for `observable,observable_type,relationship`
    pub async fn relationships_from_input(&self, input: &str) -> Result<String, AgentError> {
        let (observable, observable_type, relationship) = parse_relationship_triple(input)?;
        self.relationships(observable, observable_type, relationship).await
    }
}

impl LookupAgent for VtAgent {
    fn name(&self) -> &str {
        "VTAgent"
    }

    fn tools(&self) -> Vec<Tool> {
        let info = self.clone();
        let sample = self.clone();
        let related = self.clone();

        vec![
            Tool::new("Retrieve_url_ip_domain_Info", URL_IP_DOMAIN_DESCRIPTION, move |input| {
                let agent = info.clone();
                async move { agent.info_from_input(&input).await }
            }),
            Tool::new("Retrieve_Sample_information", SAMPLE_DESCRIPTION, move |input| {
                let agent = sample.clone();
                async move { agent.samples_info(&input).await }
            }),
            Tool::new("Retrieve_Sample_Relationships", RELATIONSHIPS_DESCRIPTION, move |input| {
                let agent = related.clone();
                async move { agent.relationships_from_input(&input).await }
            }),
        ]
    }
}
