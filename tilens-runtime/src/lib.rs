//! tilens Runtime
//!
//! The [`AgentRegistry`] owns every lookup agent and the single
//! conversational session that answers prompts with one agent's tools.

pub mod registry;

pub use registry::*;
