//! @acp:module "Template Selector"
//! @acp:summary "Rule-based template selection with confidence levels"
//! @acp:domain templates
//! @acp:layer logic

use serde::Serialize;

use super::catalog::TemplateCatalog;
use super::types::PromptTemplate;

/// @acp:summary "Selection strength, ordered Low < Medium < High"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

/// Why a template was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionReason {
    /// Id pattern found in the artifact id
    IdPattern { pattern: String, id: String },
    /// Keyword found in the heading
    Keyword { keyword: String },
    /// Nothing matched, or auto selection is off
    Default,
    /// Named by configuration or command line
    Forced,
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionReason::IdPattern { pattern, id } => {
                write!(f, "id '{}' matches pattern '{}'", id, pattern)
            }
            SelectionReason::Keyword { keyword } => write!(f, "heading contains '{}'", keyword),
            SelectionReason::Default => write!(f, "default template"),
            SelectionReason::Forced => write!(f, "forced by configuration"),
        }
    }
}

/// What the selector looks at
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub heading: &'a str,
    pub human_readable_id: Option<&'a str>,
    pub internal_id: &'a str,
}

impl SelectionInput<'_> {
    /// Id evaluated by id patterns
    pub fn id(&self) -> &str {
        self.human_readable_id.unwrap_or(self.internal_id)
    }
}

impl<'a> From<&'a crate::classify::Artifact> for SelectionInput<'a> {
    fn from(artifact: &'a crate::classify::Artifact) -> Self {
        Self {
            heading: &artifact.heading_text,
            human_readable_id: artifact.human_readable_id.as_deref(),
            internal_id: &artifact.internal_id,
        }
    }
}

/// One template that matched, with the strongest rule it matched by
#[derive(Debug, Clone)]
pub struct Candidate<'c> {
    pub template: &'c PromptTemplate,
    pub confidence: Confidence,
    pub reason: SelectionReason,
    /// Declaration position in the catalog
    pub position: usize,
}

/// @acp:summary "Outcome of selection"
#[derive(Debug, Clone)]
pub struct Selection<'c> {
    pub template: &'c PromptTemplate,
    pub confidence: Confidence,
    pub reason: SelectionReason,
}

/// Every template whose rules fire for the input, in declaration order.
///
/// A template that matches both an id pattern and a keyword is listed once,
/// with its id-pattern match.
pub fn candidates<'c>(catalog: &'c TemplateCatalog, input: &SelectionInput<'_>) -> Vec<Candidate<'c>> {
    let id = input.id();
    catalog
        .templates()
        .iter()
        .enumerate()
        .filter_map(|(position, template)| {
            if let Some(pattern) = template.rules.matching_pattern(id) {
                return Some(Candidate {
                    template,
                    confidence: Confidence::High,
                    reason: SelectionReason::IdPattern {
                        pattern: pattern.as_str().to_string(),
                        id: id.to_string(),
                    },
                    position,
                });
            }
            template
                .rules
                .matching_keyword(input.heading)
                .map(|keyword| Candidate {
                    template,
                    confidence: Confidence::Medium,
                    reason: SelectionReason::Keyword {
                        keyword: keyword.to_string(),
                    },
                    position,
                })
        })
        .collect()
}

/// Select exactly one template.
///
/// Order: forced template, then the strongest candidate (confidence first,
/// declaration order second), then the default template at low confidence.
pub fn select<'c>(catalog: &'c TemplateCatalog, input: &SelectionInput<'_>) -> Selection<'c> {
    if let Some(template) = catalog.forced() {
        return Selection {
            template,
            confidence: Confidence::High,
            reason: SelectionReason::Forced,
        };
    }

    if catalog.auto_selection() {
        let best = candidates(catalog, input)
            .into_iter()
            .min_by_key(|c| (std::cmp::Reverse(c.confidence), c.position));
        if let Some(best) = best {
            tracing::debug!(
                id = %input.id(),
                template = %best.template.name,
                confidence = %best.confidence,
                "{}",
                best.reason
            );
            return Selection {
                template: best.template,
                confidence: best.confidence,
                reason: best.reason,
            };
        }
    }

    Selection {
        template: catalog.default_template(),
        confidence: Confidence::Low,
        reason: SelectionReason::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateSettings;

    const COLLIDING: &str = r#"
default_template: fallback
templates:
  fallback:
    template: x
  first_door:
    selection:
      keywords: [door]
    template: x
  second_door:
    selection:
      keywords: [door, lock]
    template: x
  by_id:
    selection:
      id_patterns: ["^REQ_WCS_"]
    template: x
"#;

    fn input<'a>(heading: &'a str, id: Option<&'a str>) -> SelectionInput<'a> {
        SelectionInput {
            heading,
            human_readable_id: id,
            internal_id: "_internal",
        }
    }

    #[test]
    fn test_colliding_keywords_first_declared_wins() {
        let catalog = TemplateCatalog::from_yaml_str(COLLIDING, "c.yaml").unwrap();
        for _ in 0..10 {
            let s = select(&catalog, &input("Door Lock Logic", None));
            assert_eq!(s.template.name, "first_door");
            assert_eq!(s.confidence, Confidence::Medium);
        }
        assert_eq!(candidates(&catalog, &input("Door Lock Logic", None)).len(), 2);
    }

    #[test]
    fn test_id_pattern_outranks_keyword() {
        let catalog = TemplateCatalog::from_yaml_str(COLLIDING, "c.yaml").unwrap();
        let s = select(&catalog, &input("Door Control", Some("REQ_WCS_001")));
        assert_eq!(s.template.name, "by_id");
        assert_eq!(s.confidence, Confidence::High);
        assert!(matches!(s.reason, SelectionReason::IdPattern { .. }));
    }

    #[test]
    fn test_internal_id_used_when_no_human_id() {
        let catalog = TemplateCatalog::from_yaml_str(COLLIDING, "c.yaml").unwrap();
        let s = select(
            &catalog,
            &SelectionInput {
                heading: "",
                human_readable_id: None,
                internal_id: "REQ_WCS_9",
            },
        );
        assert_eq!(s.template.name, "by_id");
    }

    #[test]
    fn test_default_at_low_confidence() {
        let catalog = TemplateCatalog::from_yaml_str(COLLIDING, "c.yaml").unwrap();
        let s = select(&catalog, &input("Seat Heating", Some("REQ_SHC_001")));
        assert_eq!(s.template.name, "fallback");
        assert_eq!(s.confidence, Confidence::Low);
        assert_eq!(s.reason, SelectionReason::Default);
    }

    #[test]
    fn test_forced_and_disabled_auto_selection() {
        let forced = TemplateSettings {
            forced: Some("second_door".to_string()),
            ..Default::default()
        };
        let catalog =
            TemplateCatalog::from_sources(&[("c.yaml".to_string(), COLLIDING.to_string())], &forced)
                .unwrap();
        let s = select(&catalog, &input("Window", Some("REQ_WCS_001")));
        assert_eq!(s.template.name, "second_door");
        assert_eq!(s.reason, SelectionReason::Forced);

        let manual = TemplateSettings {
            auto_selection: false,
            ..Default::default()
        };
        let catalog =
            TemplateCatalog::from_sources(&[("c.yaml".to_string(), COLLIDING.to_string())], &manual)
                .unwrap();
        let s = select(&catalog, &input("Door", Some("REQ_WCS_001")));
        assert_eq!(s.template.name, "fallback");
        assert_eq!(s.confidence, Confidence::Low);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }
}
