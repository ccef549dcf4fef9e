//! Observables under investigation
//!
//! An observable is a raw string (IP, domain, URL or file hash) tagged with
//! the type the model claimed for it. No validation is done beyond parsing
//! the type name itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/// Kinds of observables a lookup can be made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservableType {
    /// IPv4 address
    IpAddress,
    /// Domain or hostname
    Domain,
    /// Full URL
    Url,
    /// MD5/SHA1/SHA256 of a sample
    FileHash,
}

impl ObservableType {
    pub const ALL: [ObservableType; 4] = [
        ObservableType::IpAddress,
        ObservableType::Domain,
        ObservableType::Url,
        ObservableType::FileHash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObservableType::IpAddress => "ip_address",
            ObservableType::Domain => "domain",
            ObservableType::Url => "url",
            ObservableType::FileHash => "file_hash",
        }
    }
}

impl fmt::Display for ObservableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObservableType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip_address" => Ok(ObservableType::IpAddress),
            "domain" => Ok(ObservableType::Domain),
            "url" => Ok(ObservableType::Url),
            "file_hash" => Ok(ObservableType::FileHash),
            other => Err(ParseError::UnknownObservableType(other.to_string())),
        }
    }
}

/// An observable value with its type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observable {
    pub value: String,
    pub kind: ObservableType,
}

impl Observable {
    pub fn new(value: impl Into<String>, kind: ObservableType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn ip(value: impl Into<String>) -> Self {
        Self::new(value, ObservableType::IpAddress)
    }

    pub fn domain(value: impl Into<String>) -> Self {
        Self::new(value, ObservableType::Domain)
    }

    pub fn url(value: impl Into<String>) -> Self {
        Self::new(value, ObservableType::Url)
    }

    pub fn file_hash(value: impl Into<String>) -> Self {
        Self::new(value, ObservableType::FileHash)
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.kind)
    }
}

/// Sample relationships that can be pivoted from a network observable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Samples seen talking to the observable
    CommunicatingFiles,
    /// Samples downloaded from the observable
    DownloadedFiles,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::CommunicatingFiles => "communicating_files",
            RelationshipKind::DownloadedFiles => "downloaded_files",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "communicating_files" => Ok(RelationshipKind::CommunicatingFiles),
            "downloaded_files" => Ok(RelationshipKind::DownloadedFiles),
            other => Err(ParseError::UnknownRelationship(other.to_string())),
        }
    }
}
