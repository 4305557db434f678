//! @acp:module "Template Renderer"
//! @acp:summary "Variable bags and literal placeholder substitution"
//! @acp:domain templates
//! @acp:layer output
//!
//! Substitution is a single pass over the body, so a value that itself
//! contains `{name}` text is never expanded again.

use indexmap::IndexMap;
use serde::Serialize;

use super::catalog::PLACEHOLDER;
use super::selector::{Confidence, SelectionReason};
use super::types::PromptTemplate;
use crate::error::TemplateRenderError;

/// Values treated as "not provided" for optional variables
const ABSENT_MARKERS: &[&str] = &["", "None"];

/// @acp:summary "String-keyed variables available to a template"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableBag {
    values: IndexMap<String, String>,
}

impl VariableBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn extend(&mut self, other: &VariableBag) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// @acp:summary "Rendered prompt plus how its template was chosen"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPrompt {
    pub template: String,
    pub confidence: Confidence,
    pub reason: SelectionReason,
    pub text: String,
}

/// Value a variable resolves to for this template
///
/// A required variable present in the bag is used as given, even when empty.
fn resolve<'a>(template: &'a PromptTemplate, bag: &'a VariableBag, name: &str) -> &'a str {
    match bag.get(name) {
        Some(value) if template.is_required(name) || !ABSENT_MARKERS.contains(&value) => value,
        provided => template
            .defaults
            .get(name)
            .map(String::as_str)
            .or(provided)
            .unwrap_or(""),
    }
}

/// @acp:summary "Substitute variables into a template body"
///
/// Every required variable must be present in the bag, otherwise the error
/// names all missing ones. Optional variables that are absent, empty or
/// `None` take their default; without a default they render empty.
pub fn render(template: &PromptTemplate, bag: &VariableBag) -> Result<String, TemplateRenderError> {
    let missing: Vec<String> = template
        .required_variables
        .iter()
        .filter(|v| !bag.contains(v))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(TemplateRenderError {
            template: template.name.clone(),
            missing,
        });
    }

    let text = PLACEHOLDER.replace_all(&template.body, |caps: &regex::Captures<'_>| {
        resolve(template, bag, &caps[1]).to_string()
    });
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateCatalog;

    const YAML: &str = r#"
templates:
  t:
    variables:
      required: [heading, row_count]
      optional: [info_str, extra]
      defaults:
        info_str: "None"
    template: "H={heading} R={row_count} I={info_str} E=[{extra}]"
"#;

    fn template() -> PromptTemplate {
        TemplateCatalog::from_yaml_str(YAML, "t.yaml").unwrap().templates()[0].clone()
    }

    #[test]
    fn test_missing_required_is_named() {
        let mut bag = VariableBag::new();
        bag.insert("heading", "Door");
        let err = render(&template(), &bag).unwrap_err();
        assert_eq!(err.missing, vec!["row_count".to_string()]);
        assert_eq!(err.template, "t");
    }

    #[test]
    fn test_optional_defaults_and_empty_values() {
        let mut bag = VariableBag::new();
        bag.insert("heading", "Door").insert("row_count", "2").insert("info_str", "");
        assert_eq!(render(&template(), &bag).unwrap(), "H=Door R=2 I=None E=[]");

        bag.insert("info_str", "- note").insert("extra", "x");
        assert_eq!(render(&template(), &bag).unwrap(), "H=Door R=2 I=- note E=[x]");
    }

    #[test]
    fn test_empty_required_value_ignores_default() {
        let yaml = r#"
templates:
  t:
    variables:
      required: [heading]
      defaults:
        heading: "Untitled"
    template: "H=[{heading}]"
"#;
        let template = TemplateCatalog::from_yaml_str(yaml, "t.yaml").unwrap().templates()[0].clone();
        let mut bag = VariableBag::new();
        bag.insert("heading", "");
        assert_eq!(render(&template, &bag).unwrap(), "H=[]");

        bag.insert("heading", "None");
        assert_eq!(render(&template, &bag).unwrap(), "H=[None]");
    }

    #[test]
    fn test_values_are_not_reexpanded() {
        let mut bag = VariableBag::new();
        bag.insert("heading", "{row_count}").insert("row_count", "3");
        assert_eq!(
            render(&template(), &bag).unwrap(),
            "H={row_count} R=3 I=None E=[]"
        );
    }
}
