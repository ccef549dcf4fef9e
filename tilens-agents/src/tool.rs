//! Tool descriptors handed to the conversational agent
//!
//! A tool is a name, a natural-language description and an async callable
//! taking the model's single free-text argument. The description is the only
//! thing steering the model's tool choice and argument format, so adapters
//! keep it precise.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::AgentError;

type ToolFn = dyn Fn(String) -> BoxFuture<'static, Result<String, AgentError>> + Send + Sync;

/// An immutable tool descriptor
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    func: Arc<ToolFn>,
}

impl Tool {
    pub fn new<F, Fut>(name: &str, description: &str, func: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, AgentError>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            func: Arc::new(move |input: String| func(input).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Call the tool with the model's raw argument
    pub async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        (self.func)(input.to_string()).await
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
