//! Agent Registry & Session Manager
//!
//! Holds every lookup agent by name and lazily builds one shared
//! conversational session:
//! - Agents are constructed eagerly, once, when the registry is built
//! - The first `initialize`/`run` binds the named agent's tools, a fresh
//!   conversation memory and the LLM backend into a session
//! - Every later prompt goes through that same session, whatever agent name
//!   it carries
//!
//! The session slot sits behind an async mutex, so concurrent callers can
//! never build two sessions and runs are serialized.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use tilens_agents::{
    AbuseIpdbAgent, AgentError, ConversationMemory, GreyNoiseAgent, LookupAgent, OtxAgent,
    RiskIqAgent, Session, SessionConfig, SharedBackend, Tool, Turn, VtAgent,
};
use tilens_providers::{
    create_http_client, AbuseIpdbClient, GreyNoiseClient, OtxClient, ProviderConfig,
    ProviderError, RiskIqClient, VirusTotalClient,
};

/// Errors surfaced by the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Agent '{name}' not found. Available agents are: {}", available.join(", "))]
    UnknownAgent {
        name: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Builder for registries with custom agents
pub struct AgentRegistryBuilder {
    backend: SharedBackend,
    session_config: SessionConfig,
    agents: Vec<Arc<dyn LookupAgent>>,
}

impl AgentRegistryBuilder {
    /// Add an agent. An agent with the same name is replaced in place.
    pub fn register(mut self, agent: impl LookupAgent + 'static) -> Self {
        let agent: Arc<dyn LookupAgent> = Arc::new(agent);
        match self.agents.iter().position(|a| a.name() == agent.name()) {
            Some(idx) => self.agents[idx] = agent,
            None => self.agents.push(agent),
        }
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn build(self) -> AgentRegistry {
        info!("Registry holds {} agents", self.agents.len());
        AgentRegistry {
            agents: self.agents,
            backend: self.backend,
            session_config: self.session_config,
            session: Mutex::new(None),
        }
    }
}

/// Catalog of lookup agents plus the single shared session
pub struct AgentRegistry {
    agents: Vec<Arc<dyn LookupAgent>>,
    backend: SharedBackend,
    session_config: SessionConfig,
    /// `None` until the first initialize/run
    session: Mutex<Option<Session>>,
}

impl AgentRegistry {
    pub fn builder(backend: SharedBackend) -> AgentRegistryBuilder {
        AgentRegistryBuilder {
            backend,
            session_config: SessionConfig::default(),
            agents: Vec::new(),
        }
    }

    /// Registry with the five stock provider agents
    pub fn with_default_agents(
        backend: SharedBackend,
        providers: &ProviderConfig,
        session_config: SessionConfig,
    ) -> Result<Self, RegistryError> {
        let http = create_http_client(providers)?;

        let registry = Self::builder(backend)
            .session_config(session_config)
            .register(VtAgent::from_client(VirusTotalClient::new(
                http.clone(),
                providers.virustotal.clone(),
            )))
            .register(AbuseIpdbAgent::new(Arc::new(AbuseIpdbClient::new(
                http.clone(),
                providers.abuseipdb.clone(),
            ))))
            .register(GreyNoiseAgent::new(Arc::new(GreyNoiseClient::new(
                http.clone(),
                providers.greynoise.clone(),
            ))))
            .register(OtxAgent::new(Arc::new(OtxClient::new(
                http.clone(),
                providers.otx.clone(),
            ))))
            .register(RiskIqAgent::new(Arc::new(RiskIqClient::new(
                http,
                providers.riskiq.clone(),
            ))))
            .build();

        Ok(registry)
    }

    /// Agent names in registration order
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    pub fn agent(&self, name: &str) -> Result<&Arc<dyn LookupAgent>, RegistryError> {
        self.agents
            .iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| RegistryError::UnknownAgent {
                name: name.to_string(),
                available: self.agent_names().iter().map(|n| n.to_string()).collect(),
            })
    }

    /// Tool catalog of one agent
    pub fn tools_for(&self, name: &str) -> Result<Vec<Tool>, RegistryError> {
        Ok(self.agent(name)?.tools())
    }

    /// Build the shared session with `agent_name`'s tools, unless one exists.
    /// `debug` turns on step logging for a session built by this call.
    ///
    /// The name is always checked. Once a session exists this is a no-op,
    /// even for a different agent.
    pub async fn initialize(&self, agent_name: &str, debug: bool) -> Result<(), RegistryError> {
        self.agent(agent_name)?;
        let mut slot = self.session.lock().await;
        let verbose = debug || self.session_config.verbose;
        self.ensure_session(&mut slot, agent_name, verbose)?;
        Ok(())
    }

    /// Answer `prompt` through the shared session, building it first if
    /// needed. `debug` turns on step logging for a session built by this
    /// call.
    ///
    /// The answer lands in the session memory; read it with
    /// [`memory_buffer`](Self::memory_buffer) or
    /// [`memory_turns`](Self::memory_turns).
    pub async fn run(&self, agent_name: &str, prompt: &str, debug: bool) -> Result<(), RegistryError> {
        let mut slot = self.session.lock().await;
        let verbose = debug || self.session_config.verbose;
        let session = self.ensure_session(&mut slot, agent_name, verbose)?;

        session.dispatch(prompt).await?;
        info!("Conversation buffer:\n{}", session.memory().buffer());
        Ok(())
    }

    fn ensure_session<'a>(
        &self,
        slot: &'a mut Option<Session>,
        agent_name: &str,
        verbose: bool,
    ) -> Result<&'a mut Session, RegistryError> {
        let session = match slot.take() {
            Some(session) => {
                if session.agent_name() != agent_name {
                    warn!(
                        "Session already bound to {}; ignoring request for {}",
                        session.agent_name(),
                        agent_name
                    );
                }
                session
            }
            None => {
                let agent = self.agent(agent_name)?;
                let config = SessionConfig {
                    verbose,
                    ..self.session_config.clone()
                };
                let memory = ConversationMemory::new(&config.human_prefix, &config.ai_prefix);
                Session::build(
                    agent.name(),
                    agent.tools(),
                    memory,
                    self.backend.clone(),
                    config,
                )
            }
        };
        Ok(slot.insert(session))
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Agent whose tools the session was built with
    pub async fn active_agent(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.agent_name().to_string())
    }

    /// Settings the session was built with
    pub async fn active_config(&self) -> Option<SessionConfig> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.config().clone())
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.id().to_string())
    }

    /// Rendered conversation history
    pub async fn memory_buffer(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.memory().buffer())
    }

    pub async fn memory_turns(&self) -> Vec<Turn> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.memory().turns().to_vec())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use tilens_agents::{LlmBackend, LlmError};
    use tilens_core::{ObservableType, ParseError};
    use tilens_providers::{LookupResult, ThreatIntelProvider};

    const DEFAULT_AGENTS: [&str; 5] = [
        "VTAgent",
        "AbuseIPDBAgent",
        "GreyNoiseAgent",
        "OTXAgent",
        "RiskIQAgent",
    ];

    struct ScriptedBackend {
        replies: SyncMutex<VecDeque<String>>,
    }

    impl ScriptedBackend {
        fn shared(replies: &[&str]) -> SharedBackend {
            Arc::new(Self {
                replies: SyncMutex::new(replies.iter().map(|r| r.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.replies.lock().pop_front().ok_or(LlmError::EmptyResponse)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct CountingProvider {
        calls: SyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl ThreatIntelProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "AbuseIPDB"
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
            self.calls.lock().push(observable.to_string());
            Ok(LookupResult::found(
                "AbuseIPDB",
                observable,
                ioc_type,
                query_subtype,
                json!({"data": {"abuseConfidenceScore": 100}}),
            ))
        }
    }

    fn default_registry(backend: SharedBackend) -> AgentRegistry {
        AgentRegistry::with_default_agents(
            backend,
            &ProviderConfig::default(),
            SessionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_agents_in_order() {
        let registry = default_registry(ScriptedBackend::shared(&[]));
        assert_eq!(registry.agent_names(), DEFAULT_AGENTS);
        for name in DEFAULT_AGENTS {
            assert!(!registry.tools_for(name).unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_agent_lists_available() {
        let registry = default_registry(ScriptedBackend::shared(&[]));
        let err = registry.initialize("UnknownAgent", false).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("UnknownAgent"));
        for name in DEFAULT_AGENTS {
            assert!(message.contains(name), "{} missing from: {}", name, message);
        }
        assert!(!registry.is_initialized().await);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let registry = default_registry(ScriptedBackend::shared(&[]));
        assert!(!registry.is_initialized().await);

        registry.initialize("VTAgent", false).await.unwrap();
        let first = registry.session_id().await.unwrap();
        registry.initialize("VTAgent", false).await.unwrap();

        assert_eq!(registry.session_id().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_initialize_debug_sets_verbose_once() {
        let registry = default_registry(ScriptedBackend::shared(&[]));
        assert!(registry.active_config().await.is_none());

        registry.initialize("GreyNoiseAgent", true).await.unwrap();
        assert!(registry.active_config().await.unwrap().verbose);

        // An existing session keeps the verbosity it was built with
        registry.initialize("GreyNoiseAgent", false).await.unwrap();
        assert!(registry.active_config().await.unwrap().verbose);
    }

    #[tokio::test]
    async fn test_initialize_without_debug_is_quiet() {
        let registry = default_registry(ScriptedBackend::shared(&[]));
        registry.initialize("OTXAgent", false).await.unwrap();
        assert!(!registry.active_config().await.unwrap().verbose);
    }

    #[tokio::test]
    async fn test_second_agent_is_ignored_once_ready() {
        let registry = default_registry(ScriptedBackend::shared(&[]));
        registry.initialize("VTAgent", false).await.unwrap();
        let first = registry.session_id().await.unwrap();

        registry.initialize("OTXAgent", false).await.unwrap();

        assert_eq!(registry.active_agent().await.as_deref(), Some("VTAgent"));
        assert_eq!(registry.session_id().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_concurrent_initialize_builds_one_session() {
        let registry = Arc::new(default_registry(ScriptedBackend::shared(&[])));

        let handles: Vec<_> = DEFAULT_AGENTS
            .iter()
            .map(|name| {
                let registry = registry.clone();
                let name = name.to_string();
                tokio::spawn(async move {
                    registry.initialize(&name, false).await.unwrap();
                    registry.session_id().await.unwrap()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_run_drives_one_lookup_and_one_turn() {
        let provider = Arc::new(CountingProvider::default());
        let backend = ScriptedBackend::shared(&[
            "Thought: Do I need to use a tool? Yes\nAction: Retrieve_IP_Info\nAction Input: 1.2.3.4",
            "Thought: Do I need to use a tool? No\nAI: 1.2.3.4 has an abuse confidence score of 100.",
        ]);
        let registry = AgentRegistry::builder(backend)
            .register(AbuseIpdbAgent::new(provider.clone()))
            .build();

        registry
            .run("AbuseIPDBAgent", "what do you know about 1.2.3.4", false)
            .await
            .unwrap();

        assert_eq!(provider.calls.lock().as_slice(), ["1.2.3.4"]);
        let turns = registry.memory_turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].human, "what do you know about 1.2.3.4");
        assert!(registry
            .memory_buffer()
            .await
            .unwrap()
            .contains("AI: 1.2.3.4 has an abuse confidence score of 100."));
    }

    #[tokio::test]
    async fn test_parse_error_surfaces_from_run() {
        let backend = ScriptedBackend::shared(&[
            "AI: Hello, ask me about an observable.",
            "Action: Retrieve_url_ip_domain_Info\nAction Input: 8.8.8.8",
        ]);
        let registry = default_registry(backend);

        registry.run("VTAgent", "hi", false).await.unwrap();
        let err = registry.run("VTAgent", "check 8.8.8.8", false).await.unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Agent(AgentError::Parse(ParseError::FieldCount { expected: 2, .. }))
        ));
        assert_eq!(registry.memory_turns().await.len(), 1);
    }

    #[tokio::test]
    async fn test_run_keeps_first_agent_tools() {
        let backend = ScriptedBackend::shared(&["AI: one", "AI: two"]);
        let registry = default_registry(backend);

        registry.run("RiskIQAgent", "first", false).await.unwrap();
        registry.run("OTXAgent", "second", false).await.unwrap();

        assert_eq!(registry.active_agent().await.as_deref(), Some("RiskIQAgent"));
        assert_eq!(registry.memory_turns().await.len(), 2);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let provider = Arc::new(CountingProvider::default());
        let registry = AgentRegistry::builder(ScriptedBackend::shared(&[]))
            .register(AbuseIpdbAgent::new(provider.clone()))
            .register(AbuseIpdbAgent::new(provider))
            .build();
        assert_eq!(registry.agent_names(), ["AbuseIPDBAgent"]);
    }
}
