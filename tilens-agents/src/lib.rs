//! tilens Agents
//!
//! Lookup agents that expose threat-intelligence providers as LLM tools:
//! - **VTAgent**: VirusTotal reports, samples and sample relationships
//! - **AbuseIPDBAgent**: IP abuse reports
//! - **GreyNoiseAgent**: internet scanner / benign service context for IPs
//! - **OTXAgent**: AlienVault OTX pulses for IPs, domains, URLs and samples
//! - **RiskIQAgent**: PassiveTotal summary cards for IPs and domains
//!
//! A [`Session`] binds one agent's tools to an LLM backend and a
//! conversation memory, and answers prompts with a conversational
//! ReAct loop.

pub mod backend;
pub mod traits;
pub mod tool;
pub mod memory;
pub mod session;
pub mod vt;
pub mod abuseipdb;
pub mod greynoise;
pub mod otx;
pub mod riskiq;

pub use backend::*;
pub use traits::*;
pub use tool::*;
pub use memory::*;
pub use session::*;
pub use vt::*;
pub use abuseipdb::*;
pub use greynoise::*;
pub use otx::*;
pub use riskiq::*;
