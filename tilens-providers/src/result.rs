//! Normalized lookup results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use tilens_core::{ObservableType, RelationshipKind};

/// Provider verdict bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Unknown,
    Information,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Bucket a 0-100 confidence score
    pub fn from_score(score: u64) -> Self {
        match score {
            0 => Severity::Information,
            1..=29 => Severity::Low,
            30..=74 => Severity::Medium,
            _ => Severity::High,
        }
    }

    /// Bucket a count of hits (detections, pulses, articles)
    pub fn from_hits(hits: u64) -> Self {
        match hits {
            0 => Severity::Information,
            1..=2 => Severity::Low,
            3..=9 => Severity::Medium,
            _ => Severity::High,
        }
    }
}

/// The answer from one provider for one observable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    pub ioc: String,
    pub ioc_type: ObservableType,
    pub query_subtype: Option<String>,
    pub provider: String,
    /// Whether the provider knew anything about the observable
    pub result: bool,
    pub severity: Severity,
    /// Provider specific summary fields
    pub details: Value,
    /// Full decoded response body
    pub raw_result: Value,
    /// Link to the provider's web report
    pub reference: String,
    /// HTTP status of the lookup
    pub status: u16,
}

impl LookupResult {
    pub fn found(
        provider: &str,
        ioc: &str,
        ioc_type: ObservableType,
        query_subtype: Option<&str>,
        raw_result: Value,
    ) -> Self {
        Self {
            ioc: ioc.to_string(),
            ioc_type,
            query_subtype: query_subtype.map(str::to_string),
            provider: provider.to_string(),
            result: true,
            severity: Severity::Unknown,
            details: Value::Null,
            raw_result,
            reference: String::new(),
            status: 200,
        }
    }

    pub fn not_found(
        provider: &str,
        ioc: &str,
        ioc_type: ObservableType,
        query_subtype: Option<&str>,
    ) -> Self {
        Self {
            ioc: ioc.to_string(),
            ioc_type,
            query_subtype: query_subtype.map(str::to_string),
            provider: provider.to_string(),
            result: false,
            severity: Severity::Unknown,
            details: Value::String("Not found.".to_string()),
            raw_result: Value::Null,
            reference: String::new(),
            status: 404,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// One edge returned by a relationship query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedObject {
    pub target: String,
    pub target_type: String,
}

/// Samples related to an observable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipResult {
    pub source: String,
    pub source_type: ObservableType,
    pub relationship: RelationshipKind,
    pub objects: Vec<RelatedObject>,
}

impl fmt::Display for RelationshipResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source,source_type,target,target_type,relationship_type")?;
        for object in &self.objects {
            writeln!(
                f,
                "{},{},{},{},{}",
                self.source, self.source_type, object.target, object.target_type, self.relationship
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_buckets() {
        assert_eq!(Severity::from_score(0), Severity::Information);
        assert_eq!(Severity::from_score(10), Severity::Low);
        assert_eq!(Severity::from_score(50), Severity::Medium);
        assert_eq!(Severity::from_score(100), Severity::High);
        assert_eq!(Severity::from_hits(12), Severity::High);
        assert!(Severity::High > Severity::Low);
    }

    #[test]
    fn test_display_is_json() {
        let result = LookupResult::found(
            "OTX",
            "example.com",
            ObservableType::Domain,
            None,
            json!({"pulse_info": {"count": 1}}),
        )
        .with_severity(Severity::Low);

        let text = result.to_string();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["provider"], "OTX");
        assert_eq!(parsed["ioc_type"], "domain");
        assert_eq!(parsed["severity"], "low");
    }

    #[test]
    fn test_not_found() {
        let result = LookupResult::not_found("GreyNoise", "10.0.0.1", ObservableType::IpAddress, None);
        assert!(!result.result);
        assert_eq!(result.status, 404);
    }

    #[test]
    fn test_relationship_table() {
        let result = RelationshipResult {
            source: "8.8.8.8".to_string(),
            source_type: ObservableType::IpAddress,
            relationship: RelationshipKind::CommunicatingFiles,
            objects: vec![RelatedObject {
                target: "abc123".to_string(),
                target_type: "file".to_string(),
            }],
        };
        let text = result.to_string();
        assert!(text.contains("8.8.8.8,ip_address,abc123,file,communicating_files"));
        assert_eq!(text.lines().count(), 2);
    }
}
