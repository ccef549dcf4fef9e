//! tilens Providers
//!
//! HTTP clients for the threat-intelligence services the lookup agents wrap:
//! - **VirusTotal** v3 (IOC reports, file objects, sample relationships)
//! - **AbuseIPDB** v2 (IP abuse reports)
//! - **GreyNoise** (community or enterprise IP context)
//! - **AlienVault OTX** (IP, domain, URL and file indicators)
//! - **RiskIQ PassiveTotal** (IP and domain summary cards)
//!
//! Every call is a single request. There are no retries, caches or rate
//! limiters; failures surface to the caller as [`ProviderError`].

pub mod config;
pub mod client;
pub mod result;
pub mod virustotal;
pub mod abuseipdb;
pub mod greynoise;
pub mod otx;
pub mod riskiq;

pub use config::*;
pub use client::*;
pub use result::*;
pub use virustotal::*;
pub use abuseipdb::*;
pub use greynoise::*;
pub use otx::*;
pub use riskiq::*;
