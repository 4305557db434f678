//! @acp:module "Template Types"
//! @acp:summary "Serde model of template definition files and compiled templates"
//! @acp:domain templates
//! @acp:layer types

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level layout of a template definition file
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateFile {
    #[serde(default)]
    pub default_template: Option<String>,

    #[serde(default)]
    pub auto_selection: Option<bool>,

    #[serde(default)]
    pub case_sensitive: Option<bool>,

    /// Templates in declaration order; duplicate keys are kept so the
    /// catalog can reject them
    #[serde(deserialize_with = "ordered_entries")]
    pub templates: Vec<(String, TemplateDefinition)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDefinition {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub variables: VariableSpec,

    #[serde(default)]
    pub selection: SelectionSpec,

    pub template: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableSpec {
    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default)]
    pub optional: Vec<String>,

    /// Scalar defaults; non-string scalars are stringified
    #[serde(default)]
    pub defaults: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionSpec {
    /// Regular expressions searched in the artifact id (high confidence)
    #[serde(default)]
    pub id_patterns: Vec<String>,

    /// Substrings of the heading (medium confidence)
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub case_sensitive: Option<bool>,
}

fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<(String, TemplateDefinition)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, TemplateDefinition)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of template name to template definition")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, definition)) = map.next_entry::<String, TemplateDefinition>()? {
                entries.push((name, definition));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

/// Render a YAML scalar the way it reads in the file
pub(crate) fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// @acp:summary "Compiled selection rules of one template"
#[derive(Debug, Clone)]
pub struct SelectionRules {
    pub id_patterns: Vec<Regex>,
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
}

impl SelectionRules {
    /// First id pattern found in `id`
    pub fn matching_pattern(&self, id: &str) -> Option<&Regex> {
        self.id_patterns.iter().find(|p| p.is_match(id))
    }

    /// First keyword contained in `heading`
    pub fn matching_keyword(&self, heading: &str) -> Option<&str> {
        if self.case_sensitive {
            self.keywords
                .iter()
                .find(|k| heading.contains(k.as_str()))
                .map(String::as_str)
        } else {
            let heading = heading.to_lowercase();
            self.keywords
                .iter()
                .find(|k| heading.contains(&k.to_lowercase()))
                .map(String::as_str)
        }
    }
}

/// @acp:summary "Validated, read-only prompt template"
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub required_variables: Vec<String>,
    pub optional_variables: Vec<String>,
    pub defaults: IndexMap<String, String>,
    pub body: String,
    /// Distinct placeholder names in order of first appearance
    pub placeholders: Vec<String>,
    pub rules: SelectionRules,
    /// File the template was declared in
    pub origin: String,
}

impl PromptTemplate {
    pub fn is_required(&self, variable: &str) -> bool {
        self.required_variables.iter().any(|v| v == variable)
    }

    /// Variable declared as required, optional or through a default
    pub fn declares(&self, variable: &str) -> bool {
        self.is_required(variable)
            || self.optional_variables.iter().any(|v| v == variable)
            || self.defaults.contains_key(variable)
    }
}

/// Listing entry for `templates list`
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub id_patterns: Vec<String>,
    pub keywords: Vec<String>,
    pub is_default: bool,
    pub origin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_declaration_order() {
        let file: TemplateFile = serde_yaml::from_str(
            "templates:\n  zeta:\n    template: z\n  alpha:\n    template: a\n  mid:\n    template: m\n",
        )
        .unwrap();
        let names: Vec<&str> = file.templates.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(file.default_template, None);
    }

    #[test]
    fn test_scalar_defaults_are_stringified() {
        assert_eq!(scalar_to_string(&serde_yaml::Value::from(3)), "3");
        assert_eq!(scalar_to_string(&serde_yaml::Value::from(true)), "true");
        assert_eq!(scalar_to_string(&serde_yaml::Value::Null), "");
        assert_eq!(scalar_to_string(&serde_yaml::Value::from("None")), "None");
    }

    #[test]
    fn test_keyword_case_handling() {
        let rules = SelectionRules {
            id_patterns: vec![],
            keywords: vec!["Door".to_string()],
            case_sensitive: false,
        };
        assert_eq!(rules.matching_keyword("front door lock"), Some("Door"));
        let strict = SelectionRules {
            case_sensitive: true,
            ..rules
        };
        assert_eq!(strict.matching_keyword("front door lock"), None);
        assert_eq!(strict.matching_keyword("Door Control"), Some("Door"));
    }
}
