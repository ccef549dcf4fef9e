//! Conversational ReAct session
//!
//! A session binds one agent's tools, a conversation memory and an LLM
//! backend. Each prompt runs a reasoning loop:
//! - the model sees the tool catalog, the conversation so far and its own
//!   scratchpad of earlier actions
//! - it either names a tool (`Action:` / `Action Input:`) or answers with
//!   the AI prefix
//! - tool output is fed back as an `Observation:` until the model answers
//!
//! Only completed exchanges reach the memory; a failed turn leaves it as it
//! was.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{AgentError, ConversationMemory, SharedBackend, Tool};

const OBSERVATION_PREFIX: &str = "Observation: ";
const THOUGHT_PREFIX: &str = "Thought:";
const STOP_SEQUENCE: &str = "\nObservation:";

const PREAMBLE: &str = r#"Assistant is a large language model working as a threat intelligence analyst for a security operations team.

Assistant helps investigate observables such as IP addresses, domains, URLs and file hashes. It can hold a natural conversation, but whenever a question needs facts about an observable, Assistant looks them up with its tools instead of relying on memory, and bases its answer on what the tools return.

TOOLS:
------

Assistant has access to the following tools:"#;

static ACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Action: (.*?)[\n]*Action Input: ([\s\S]*)").unwrap()
});

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on tool calls per prompt
    pub max_iterations: usize,
    pub human_prefix: String,
    pub ai_prefix: String,
    /// Log every reasoning step at INFO instead of DEBUG
    pub verbose: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            human_prefix: "Human".to_string(),
            ai_prefix: "AI".to_string(),
            verbose: false,
        }
    }
}

impl SessionConfig {
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// What the model decided to do on one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// Call a tool
    Action {
        tool: String,
        input: String,
        log: String,
    },
    /// Reply to the human
    Finish { output: String },
}

/// Interpret one model completion
pub fn parse_step(text: &str, ai_prefix: &str) -> Result<AgentStep, AgentError> {
    let marker = format!("{}:", ai_prefix);
    if let Some(idx) = text.rfind(&marker) {
        return Ok(AgentStep::Finish {
            output: text[idx + marker.len()..].trim().to_string(),
        });
    }

    let caps = ACTION_REGEX
        .captures(text)
        .ok_or_else(|| AgentError::OutputParse(text.to_string()))?;

    Ok(AgentStep::Action {
        tool: caps[1].trim().to_string(),
        input: caps[2].trim().trim_matches('"').to_string(),
        log: text.to_string(),
    })
}

/// A conversational agent bound to one set of tools
pub struct Session {
    id: String,
    agent_name: String,
    tools: Vec<Tool>,
    memory: ConversationMemory,
    backend: SharedBackend,
    config: SessionConfig,
}

impl Session {
    /// Bind tools, memory and model into a new session
    pub fn build(
        agent_name: &str,
        tools: Vec<Tool>,
        memory: ConversationMemory,
        backend: SharedBackend,
        config: SessionConfig,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        info!(
            "Session {} built for {} with {} tools on {}",
            &id[..8],
            agent_name,
            tools.len(),
            backend.model_name()
        );
        Self {
            id,
            agent_name: agent_name.to_string(),
            tools,
            memory,
            backend,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the agent whose tools this session holds
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn trace(&self, message: &str) {
        if self.config.verbose {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    fn tool_names(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Preamble, tool catalog and format instructions
    pub fn system_prompt(&self) -> String {
        let catalog = self
            .tools
            .iter()
            .map(|t| format!("> {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{preamble}\n\n{catalog}\n\n\
             To use a tool, please use the following format:\n\n\
             ```\n\
             Thought: Do I need to use a tool? Yes\n\
             Action: the action to take, should be one of [{names}]\n\
             Action Input: the input to the action\n\
             Observation: the result of the action\n\
             ```\n\n\
             When you have a response to say to the {human}, or if you do not need to use a tool, you MUST use the format:\n\n\
             ```\n\
             Thought: Do I need to use a tool? No\n\
             {ai}: [your response here]\n\
             ```",
            preamble = PREAMBLE,
            catalog = catalog,
            names = self.tool_names(),
            human = self.config.human_prefix,
            ai = self.config.ai_prefix,
        )
    }

    /// History, the new input and the scratchpad of this turn
    pub fn user_prompt(&self, input: &str, scratchpad: &str) -> String {
        format!(
            "Begin!\n\nPrevious conversation history:\n{}\n\nNew input: {}\n{}",
            self.memory.buffer(),
            input,
            scratchpad
        )
    }

    /// Answer one prompt, calling tools as the model asks.
    ///
    /// Tool errors abort the turn and propagate; the memory only grows when
    /// the model produced an answer.
    pub async fn dispatch(&mut self, input: &str) -> Result<String, AgentError> {
        let system = self.system_prompt();
        let mut scratchpad = String::new();

        for step in 0..self.config.max_iterations {
            let user = self.user_prompt(input, &scratchpad);
            let completion = self
                .backend
                .generate_until(&system, &user, &[STOP_SEQUENCE])
                .await?;
            self.trace(&format!("[{}] step {}:\n{}", self.agent_name, step + 1, completion.trim()));

            match parse_step(&completion, &self.config.ai_prefix)? {
                AgentStep::Finish { output } => {
                    self.memory.append(input, &output);
                    return Ok(output);
                }
                AgentStep::Action { tool, input: tool_input, log } => {
                    let observation = match self.tools.iter().find(|t| t.name() == tool) {
                        Some(t) => t.invoke(&tool_input).await?,
                        None => format!("{} is not a valid tool, try another one.", tool),
                    };
                    self.trace(&format!("{}{}", OBSERVATION_PREFIX, observation));

                    scratchpad.push_str(&log);
                    scratchpad.push('\n');
                    scratchpad.push_str(OBSERVATION_PREFIX);
                    scratchpad.push_str(&observation);
                    scratchpad.push('\n');
                    scratchpad.push_str(THOUGHT_PREFIX);
                }
            }
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmBackend, LlmError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays canned completions and records the prompts it was given
    struct ScriptedBackend {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, _system: &str, user: &str) -> Result<String, LlmError> {
            self.prompts.lock().push(user.to_string());
            self.replies.lock().pop_front().ok_or(LlmError::EmptyResponse)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn echo_tool() -> Tool {
        Tool::new("Echo", "Repeats its input.", |input| async move {
            Ok(format!("echoed {}", input))
        })
    }

    fn failing_tool() -> Tool {
        Tool::new("Split", "Needs two fields.", |input| async move {
            let (a, _) = tilens_core::parse_observable_pair(&input)?;
            Ok::<_, AgentError>(a.to_string())
        })
    }

    #[test]
    fn test_parse_finish() {
        let step = parse_step("Thought: Do I need to use a tool? No\nAI: All clear.", "AI").unwrap();
        assert_eq!(step, AgentStep::Finish { output: "All clear.".to_string() });
    }

    #[test]
    fn test_parse_action() {
        let step = parse_step(
            "Thought: Do I need to use a tool? Yes\nAction: Retrieve_IP_Info\nAction Input: \"1.2.3.4\"\n",
            "AI",
        )
        .unwrap();
        match step {
            AgentStep::Action { tool, input, .. } => {
                assert_eq!(tool, "Retrieve_IP_Info");
                assert_eq!(input, "1.2.3.4");
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_step("I think the IP is fine", "AI"),
            Err(AgentError::OutputParse(_))
        ));
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let backend = ScriptedBackend::new(&[]);
        let session = Session::build(
            "TestAgent",
            vec![echo_tool(), failing_tool()],
            ConversationMemory::default(),
            backend,
            SessionConfig::default(),
        );
        let prompt = session.system_prompt();
        assert!(prompt.contains("> Echo: Repeats its input."));
        assert!(prompt.contains("should be one of [Echo, Split]"));
        assert!(prompt.contains("AI: [your response here]"));
    }

    #[tokio::test]
    async fn test_dispatch_with_tool_call() {
        let backend = ScriptedBackend::new(&[
            "Thought: Do I need to use a tool? Yes\nAction: Echo\nAction Input: ping\nObservation: invented",
            "Thought: Do I need to use a tool? No\nAI: The tool said echoed ping.",
        ]);
        let mut session = Session::build(
            "TestAgent",
            vec![echo_tool()],
            ConversationMemory::default(),
            backend.clone(),
            SessionConfig::default(),
        );

        let answer = session.dispatch("say ping").await.unwrap();
        assert_eq!(answer, "The tool said echoed ping.");
        assert_eq!(session.memory().len(), 1);

        let prompts = backend.prompts.lock();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Observation: echoed ping\nThought:"));
        // The model's own fake observation was cut off
        assert!(!prompts[1].contains("invented"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_observed() {
        let backend = ScriptedBackend::new(&[
            "Action: Nope\nAction Input: x",
            "AI: giving up",
        ]);
        let mut session = Session::build(
            "TestAgent",
            vec![echo_tool()],
            ConversationMemory::default(),
            backend.clone(),
            SessionConfig::default(),
        );

        session.dispatch("hello").await.unwrap();
        assert!(backend.prompts.lock()[1].contains("Nope is not a valid tool, try another one."));
    }

    #[tokio::test]
    async fn test_tool_error_propagates_and_keeps_memory() {
        let backend = ScriptedBackend::new(&[
            "AI: first answer",
            "Action: Split\nAction Input: 8.8.8.8",
        ]);
        let mut session = Session::build(
            "TestAgent",
            vec![failing_tool()],
            ConversationMemory::default(),
            backend,
            SessionConfig::default(),
        );

        session.dispatch("first").await.unwrap();
        let err = session.dispatch("second").await.unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
        assert_eq!(session.memory().len(), 1);
        assert_eq!(session.memory().turns()[0].ai, "first answer");
    }

    #[tokio::test]
    async fn test_history_in_prompt() {
        let backend = ScriptedBackend::new(&["AI: one", "AI: two"]);
        let mut session = Session::build(
            "TestAgent",
            vec![],
            ConversationMemory::default(),
            backend.clone(),
            SessionConfig::default(),
        );

        session.dispatch("first question").await.unwrap();
        session.dispatch("second question").await.unwrap();

        let prompts = backend.prompts.lock();
        assert!(prompts[1].contains("Human: first question\nAI: one"));
        assert!(prompts[1].contains("New input: second question"));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let loop_reply = "Action: Echo\nAction Input: again";
        let backend = ScriptedBackend::new(&[loop_reply, loop_reply, loop_reply]);
        let mut session = Session::build(
            "TestAgent",
            vec![echo_tool()],
            ConversationMemory::default(),
            backend,
            SessionConfig::default().with_max_iterations(2),
        );

        let err = session.dispatch("loop").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(2)));
        assert!(session.memory().is_empty());
    }
}
