//! Provider credentials and endpoints
//!
//! Keys come from the environment by default. A TOML file can override any
//! of them; anything the file leaves out still falls back to the environment.
//!
//! ```toml
//! timeout_secs = 30
//!
//! [virustotal]
//! api_key = "..."
//!
//! [riskiq]
//! username = "analyst@example.com"
//! api_key = "..."
//! ```

use serde::Deserialize;
use std::env;
use std::path::Path;

use crate::ProviderError;

fn env_key(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for every provider client
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub virustotal: VirusTotalConfig,
    #[serde(default)]
    pub abuseipdb: AbuseIpdbConfig,
    #[serde(default)]
    pub greynoise: GreyNoiseConfig,
    #[serde(default)]
    pub otx: OtxConfig,
    #[serde(default)]
    pub riskiq: RiskIqConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            virustotal: VirusTotalConfig::default(),
            abuseipdb: AbuseIpdbConfig::default(),
            greynoise: GreyNoiseConfig::default(),
            otx: OtxConfig::default(),
            riskiq: RiskIqConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ProviderError> {
        toml::from_str(content).map_err(|e| ProviderError::Config(e.to_string()))
    }

    /// Load a TOML config file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

/// VirusTotal v3
#[derive(Debug, Clone, Deserialize)]
pub struct VirusTotalConfig {
    #[serde(default = "VirusTotalConfig::env_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "VirusTotalConfig::default_base_url")]
    pub base_url: String,
}

impl VirusTotalConfig {
    fn env_api_key() -> Option<String> {
        env_key("VIRUSTOTAL_API_KEY")
    }

    fn default_base_url() -> String {
        "https://www.virustotal.com/api/v3".to_string()
    }
}

impl Default for VirusTotalConfig {
    fn default() -> Self {
        Self {
            api_key: Self::env_api_key(),
            base_url: Self::default_base_url(),
        }
    }
}

/// AbuseIPDB v2
#[derive(Debug, Clone, Deserialize)]
pub struct AbuseIpdbConfig {
    #[serde(default = "AbuseIpdbConfig::env_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "AbuseIpdbConfig::default_base_url")]
    pub base_url: String,
    /// Report window for the check endpoint
    #[serde(default = "AbuseIpdbConfig::default_max_age_days")]
    pub max_age_days: u32,
}

impl AbuseIpdbConfig {
    fn env_api_key() -> Option<String> {
        env_key("ABUSEIPDB_API_KEY")
    }

    fn default_base_url() -> String {
        "https://api.abuseipdb.com/api/v2".to_string()
    }

    fn default_max_age_days() -> u32 {
        90
    }
}

impl Default for AbuseIpdbConfig {
    fn default() -> Self {
        Self {
            api_key: Self::env_api_key(),
            base_url: Self::default_base_url(),
            max_age_days: Self::default_max_age_days(),
        }
    }
}

/// GreyNoise community or enterprise API
#[derive(Debug, Clone, Deserialize)]
pub struct GreyNoiseConfig {
    #[serde(default = "GreyNoiseConfig::env_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "GreyNoiseConfig::default_base_url")]
    pub base_url: String,
    /// Use the enterprise context endpoint for `full` queries
    #[serde(default)]
    pub enterprise: bool,
}

impl GreyNoiseConfig {
    fn env_api_key() -> Option<String> {
        env_key("GREYNOISE_API_KEY")
    }

    fn default_base_url() -> String {
        "https://api.greynoise.io".to_string()
    }
}

impl Default for GreyNoiseConfig {
    fn default() -> Self {
        Self {
            api_key: Self::env_api_key(),
            base_url: Self::default_base_url(),
            enterprise: false,
        }
    }
}

/// AlienVault OTX
#[derive(Debug, Clone, Deserialize)]
pub struct OtxConfig {
    #[serde(default = "OtxConfig::env_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "OtxConfig::default_base_url")]
    pub base_url: String,
}

impl OtxConfig {
    fn env_api_key() -> Option<String> {
        env_key("OTX_API_KEY")
    }

    fn default_base_url() -> String {
        "https://otx.alienvault.com/api/v1".to_string()
    }
}

impl Default for OtxConfig {
    fn default() -> Self {
        Self {
            api_key: Self::env_api_key(),
            base_url: Self::default_base_url(),
        }
    }
}

/// RiskIQ PassiveTotal (HTTP basic auth)
#[derive(Debug, Clone, Deserialize)]
pub struct RiskIqConfig {
    #[serde(default = "RiskIqConfig::env_username")]
    pub username: Option<String>,
    #[serde(default = "RiskIqConfig::env_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "RiskIqConfig::default_base_url")]
    pub base_url: String,
}

impl RiskIqConfig {
    fn env_username() -> Option<String> {
        env_key("RISKIQ_USERNAME")
    }

    fn env_api_key() -> Option<String> {
        env_key("RISKIQ_API_KEY")
    }

    fn default_base_url() -> String {
        "https://api.passivetotal.org".to_string()
    }
}

impl Default for RiskIqConfig {
    fn default() -> Self {
        Self {
            username: Self::env_username(),
            api_key: Self::env_api_key(),
            base_url: Self::default_base_url(),
        }
    }
}
