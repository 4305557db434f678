//! @acp:module "Classification Rules"
//! @acp:summary "Ordered rule table mapping type labels and content to artifact types"
//! @acp:domain reqif
//! @acp:layer logic
//!
//! Rules are evaluated top to bottom and the first match wins. Label rules
//! come first; the two content rules are the textual fallback for objects
//! whose type label is missing or unknown.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::table::has_table_marker;

/// @acp:summary "Semantic type of an artifact"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Heading,
    Information,
    SystemInterface,
    SystemRequirement,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Heading => "Heading",
            ArtifactType::Information => "Information",
            ArtifactType::SystemInterface => "System Interface",
            ArtifactType::SystemRequirement => "System Requirement",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interface-style signal name at the start of the text, e.g. `B_DOOR_OPEN:`
static SIGNAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+\s*:").unwrap());

/// What a rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Type label contains one of the tokens (case-insensitive)
    LabelContains(&'static [&'static str]),
    /// Text starts with an interface-style signal name
    SignalName,
    /// Content carries a table-start marker
    TableMarker,
}

/// @acp:summary "One row of the classification table"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub matcher: Matcher,
    pub artifact_type: ArtifactType,
}

/// Classification table, first match wins
pub const RULES: &[Rule] = &[
    Rule {
        matcher: Matcher::LabelContains(&["heading"]),
        artifact_type: ArtifactType::Heading,
    },
    Rule {
        matcher: Matcher::LabelContains(&["interface"]),
        artifact_type: ArtifactType::SystemInterface,
    },
    Rule {
        matcher: Matcher::LabelContains(&["requirement"]),
        artifact_type: ArtifactType::SystemRequirement,
    },
    Rule {
        matcher: Matcher::LabelContains(&["information", "parameter"]),
        artifact_type: ArtifactType::Information,
    },
    Rule {
        matcher: Matcher::SignalName,
        artifact_type: ArtifactType::SystemInterface,
    },
    Rule {
        matcher: Matcher::TableMarker,
        artifact_type: ArtifactType::SystemRequirement,
    },
];

/// Facts about one object that rules are evaluated against
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub label: Option<&'a str>,
    pub text: &'a str,
    pub raw_content: &'a str,
}

impl Matcher {
    pub fn matches(&self, input: &RuleInput<'_>) -> bool {
        match self {
            Matcher::LabelContains(tokens) => input.label.is_some_and(|label| {
                let label = label.to_lowercase();
                tokens.iter().any(|t| label.contains(t))
            }),
            Matcher::SignalName => SIGNAL_NAME.is_match(input.text.trim_start()),
            Matcher::TableMarker => has_table_marker(input.raw_content),
        }
    }
}

/// Position and rule of the first match in `rules`
pub fn first_match<'r>(rules: &'r [Rule], input: &RuleInput<'_>) -> Option<(usize, &'r Rule)> {
    rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matcher.matches(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(label: Option<&str>, text: &str, raw: &str) -> Option<ArtifactType> {
        first_match(
            RULES,
            &RuleInput {
                label,
                text,
                raw_content: raw,
            },
        )
        .map(|(_, rule)| rule.artifact_type)
    }

    #[test]
    fn test_labels_map_to_types() {
        assert_eq!(classify(Some("Heading"), "", ""), Some(ArtifactType::Heading));
        assert_eq!(
            classify(Some("System Requirements"), "", ""),
            Some(ArtifactType::SystemRequirement)
        );
        assert_eq!(
            classify(Some("System Interface"), "", ""),
            Some(ArtifactType::SystemInterface)
        );
        assert_eq!(
            classify(Some("Design Information"), "", ""),
            Some(ArtifactType::Information)
        );
        assert_eq!(
            classify(Some("Application Parameter"), "", ""),
            Some(ArtifactType::Information)
        );
    }

    #[test]
    fn test_label_outranks_content() {
        assert_eq!(
            classify(Some("Information"), "B_DOOR_OPEN: signal", "<table>"),
            Some(ArtifactType::Information)
        );
    }

    #[test]
    fn test_textual_fallback() {
        assert_eq!(
            classify(Some("Custom"), "B_RAIN_DETECTED: rain sensor", ""),
            Some(ArtifactType::SystemInterface)
        );
        assert_eq!(
            classify(None, "Logic", "<html:table><tr/></html:table>"),
            Some(ArtifactType::SystemRequirement)
        );
        assert_eq!(classify(None, "Plain prose: nothing else", ""), None);
    }

    #[test]
    fn test_rule_order_is_stable() {
        let (index, _) = first_match(
            RULES,
            &RuleInput {
                label: Some("Interface Requirement"),
                text: "",
                raw_content: "",
            },
        )
        .unwrap();
        assert_eq!(index, 1);
    }
}
