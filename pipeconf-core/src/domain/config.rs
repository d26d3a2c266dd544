//! Pipeline configuration domain types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, versioned unit of pipeline definition text.
///
/// Stored as a flat JSON document. `version` starts at 1 and grows by exactly
/// one on every update, including rollbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ConfigCategory,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub version: u64,
    pub enabled: bool,
    pub test_status: TestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

/// Which section of a pipeline a configuration defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigCategory {
    Input,
    Filter,
    Output,
}

impl ConfigCategory {
    pub const ALL: [ConfigCategory; 3] = [Self::Input, Self::Filter, Self::Output];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigCategory::Input => "input",
            ConfigCategory::Filter => "filter",
            ConfigCategory::Output => "output",
        }
    }

    /// The content rule a configuration of this category must satisfy
    pub fn content_rule(&self) -> ContentRule {
        ContentRule::RequiresMarker(self.as_str())
    }
}

impl std::fmt::Display for ConfigCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(ConfigCategory::Input),
            "filter" => Ok(ConfigCategory::Filter),
            "output" => Ok(ConfigCategory::Output),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Minimal sanity check applied to configuration content.
///
/// This is not a parser. A rule only guards against content that obviously
/// belongs to another section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// Content must mention the given keyword somewhere
    RequiresMarker(&'static str),
}

impl ContentRule {
    pub fn check(&self, content: &str) -> Result<(), String> {
        match self {
            ContentRule::RequiresMarker(marker) => {
                if content.contains(marker) {
                    Ok(())
                } else {
                    Err(format!("content must contain the '{}' keyword", marker))
                }
            }
        }
    }
}

/// Outcome of the most recent dry run of the current content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Untested,
    Testing,
    Passed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_rule_per_category() {
        assert!(ConfigCategory::Filter.content_rule().check("filter { }").is_ok());
        assert!(ConfigCategory::Input.content_rule().check("input { stdin {} }").is_ok());
        assert!(ConfigCategory::Output.content_rule().check("filter { }").is_err());
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in ConfigCategory::ALL {
            assert_eq!(category.as_str().parse::<ConfigCategory>(), Ok(category));
        }
        assert!("codec".parse::<ConfigCategory>().is_err());
    }

    #[test]
    fn test_serialized_shape_is_flat_and_lowercase() {
        let now = Utc::now();
        let config = PipelineConfig {
            id: "c1".to_string(),
            name: "A".to_string(),
            description: String::new(),
            category: ConfigCategory::Filter,
            content: "filter { }".to_string(),
            tags: BTreeSet::from(["b".to_string(), "a".to_string()]),
            version: 1,
            enabled: true,
            test_status: TestStatus::Untested,
            created_at: now,
            updated_at: now,
            created_by: "alice".to_string(),
            updated_by: "alice".to_string(),
        };

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["category"], "filter");
        assert_eq!(value["test_status"], "untested");
        assert_eq!(value["tags"], serde_json::json!(["a", "b"]));
    }
}
