//! Common traits for lookup agents

use thiserror::Error;

use tilens_core::{truncate, ObservableType, ParseError};
use tilens_providers::{ProviderError, ThreatIntelProvider};

use crate::{LlmError, Tool};

/// Errors from agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Could not parse LLM output: `{0}`")]
    OutputParse(String),

    #[error("Agent stopped after {0} iterations")]
    MaxIterations(usize),
}

/// A threat-intelligence provider exposed as a set of tools.
///
/// Implement this to add a new provider; the registry only ever sees the
/// agent name and its tool list.
pub trait LookupAgent: Send + Sync {
    /// Registry key, e.g. `VTAgent`
    fn name(&self) -> &str;

    /// Tools in presentation order. Deterministic and side-effect free.
    fn tools(&self) -> Vec<Tool>;
}

/// Run a provider lookup and cut the rendered result to the output budget
pub async fn lookup_truncated(
    provider: &dyn ThreatIntelProvider,
    observable: &str,
    ioc_type: ObservableType,
    query_subtype: Option<&str>,
) -> Result<String, AgentError> {
    let result = provider.lookup(observable, ioc_type, query_subtype).await?;
    Ok(truncate(&result.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AbuseIpdbAgent, GreyNoiseAgent, OtxAgent, RiskIqAgent};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tilens_core::TRUNCATION_BUDGET;
    use tilens_providers::LookupResult;

    /// Records lookups and answers with an oversized payload
    #[derive(Default)]
    struct FakeProvider {
        calls: Mutex<Vec<(String, ObservableType, Option<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl ThreatIntelProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "Fake"
        }

        fn supported_types(&self) -> &'static [ObservableType] {
            &ObservableType::ALL
        }

        async fn lookup(
            &self,
            observable: &str,
            ioc_type: ObservableType,
            query_subtype: Option<&str>,
        ) -> Result<LookupResult, ProviderError> {
            self.calls.lock().push((
                observable.to_string(),
                ioc_type,
                query_subtype.map(str::to_string),
            ));
            if self.fail {
                return Err(ProviderError::MissingCredentials("Fake"));
            }
            Ok(LookupResult::found(
                "Fake",
                observable,
                ioc_type,
                query_subtype,
                json!({"padding": "p".repeat(6000)}),
            ))
        }
    }

    fn simple_agents(provider: Arc<FakeProvider>) -> Vec<Box<dyn LookupAgent>> {
        vec![
            Box::new(AbuseIpdbAgent::new(provider.clone())),
            Box::new(GreyNoiseAgent::new(provider.clone())),
            Box::new(OtxAgent::new(provider.clone())),
            Box::new(RiskIqAgent::new(provider)),
        ]
    }

    #[test]
    fn test_tool_names_unique_and_stable() {
        for agent in simple_agents(Arc::new(FakeProvider::default())) {
            let tools = agent.tools();
            assert!(!tools.is_empty(), "{} has no tools", agent.name());

            let names: HashSet<&str> = tools.iter().map(|t| t.name()).collect();
            assert_eq!(names.len(), tools.len(), "{} repeats a tool name", agent.name());

            let again: Vec<String> = agent.tools().iter().map(|t| t.name().to_string()).collect();
            let first: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
            assert_eq!(first, again);
        }
    }

    #[tokio::test]
    async fn test_every_tool_truncates() {
        let provider = Arc::new(FakeProvider::default());
        for agent in simple_agents(provider.clone()) {
            for tool in agent.tools() {
                let out = tool.invoke("1.2.3.4").await.unwrap();
                assert_eq!(out.chars().count(), TRUNCATION_BUDGET, "{}", tool.name());
            }
        }
        // 1 + 1 + 4 + 2 tools
        assert_eq!(provider.calls.lock().len(), 8);
    }

    #[tokio::test]
    async fn test_abuseipdb_full_ipv4_query() {
        let provider = Arc::new(FakeProvider::default());
        let agent = AbuseIpdbAgent::new(provider.clone());
        agent.ip_info("1.2.3.4").await.unwrap();

        let calls = provider.calls.lock();
        assert_eq!(
            calls[0],
            ("1.2.3.4".to_string(), ObservableType::IpAddress, Some("full".to_string()))
        );
    }

    #[tokio::test]
    async fn test_otx_types() {
        let provider = Arc::new(FakeProvider::default());
        let agent = OtxAgent::new(provider.clone());
        agent.domain_info("example.com").await.unwrap();
        agent.url_info("http://example.com/a").await.unwrap();
        agent.samples_info("44d88612fea8a8f36de82e1278abb02f").await.unwrap();

        let kinds: Vec<ObservableType> = provider.calls.lock().iter().map(|c| c.1).collect();
        assert_eq!(
            kinds,
            vec![ObservableType::Domain, ObservableType::Url, ObservableType::FileHash]
        );
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(FakeProvider {
            fail: true,
            ..Default::default()
        });
        let agent = RiskIqAgent::new(provider);
        let err = agent.domain_info("example.com").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(ProviderError::MissingCredentials(_))));
    }
}
