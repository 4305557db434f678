//! @acp:module "Artifact Classifier"
//! @acp:summary "Walk SPEC-OBJECTs in document order and build typed artifacts"
//! @acp:domain reqif
//! @acp:layer logic
//!
//! Every SPEC-OBJECT yields exactly one artifact. Objects that no rule
//! recognises become `Information` and raise a [`ClassificationWarning`];
//! nothing is dropped.

pub mod rules;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::container::{RawDocument, RawNode};
use crate::table::{extract_table, ExtractOptions, Table, TableParseWarning};

pub use rules::{first_match, ArtifactType, Matcher, Rule, RuleInput, RULES};

/// Long name of the attribute carrying the short-form identifier
pub const FOREIGN_ID_ATTRIBUTE: &str = "ReqIF.ForeignID";
/// Long name of the attribute carrying the XHTML content
pub const TEXT_ATTRIBUTE: &str = "ReqIF.Text";
/// Long name of the attribute carrying a heading title
pub const CHAPTER_NAME_ATTRIBUTE: &str = "ReqIF.ChapterName";
/// Heading of artifacts that precede the first Heading
pub const NO_HEADING: &str = "No Heading";

static SHORT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]{0,63}$").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// @acp:summary "Classified unit of work"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub internal_id: String,
    pub human_readable_id: Option<String>,
    pub artifact_type: ArtifactType,
    /// Type label the object declared, if it resolved
    pub type_label: Option<String>,
    pub heading_text: String,
    /// Plain text of the content, whitespace collapsed
    pub text: String,
    /// Original markup fragment
    pub raw_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    pub order_index: usize,
}

impl Artifact {
    /// Human readable id when present, internal id otherwise
    pub fn display_id(&self) -> &str {
        self.human_readable_id
            .as_deref()
            .unwrap_or(&self.internal_id)
    }
}

/// @acp:summary "Recovered classification problems"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationWarning {
    /// No rule matched; emitted as Information
    Unclassified {
        internal_id: String,
        label: Option<String>,
    },
    /// Type reference points at no SPEC-OBJECT-TYPE
    UnknownType { internal_id: String, type_ref: String },
    /// ForeignID value is not a short-form identifier and was ignored
    RejectedForeignId { internal_id: String, value: String },
    /// SPEC-OBJECT without IDENTIFIER; a positional id was assigned
    MissingIdentifier { order_index: usize, assigned: String },
}

impl std::fmt::Display for ClassificationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationWarning::Unclassified { internal_id, label } => write!(
                f,
                "'{}' matched no rule (label {}), treated as Information",
                internal_id,
                label.as_deref().unwrap_or("<none>")
            ),
            ClassificationWarning::UnknownType {
                internal_id,
                type_ref,
            } => write!(f, "'{}' references unknown type '{}'", internal_id, type_ref),
            ClassificationWarning::RejectedForeignId { internal_id, value } => write!(
                f,
                "'{}' has ForeignID '{}' which is not a short-form id",
                internal_id, value
            ),
            ClassificationWarning::MissingIdentifier {
                order_index,
                assigned,
            } => write!(
                f,
                "object #{} has no IDENTIFIER, using '{}'",
                order_index, assigned
            ),
        }
    }
}

/// Table warning attributed to an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactTableWarning {
    pub artifact_id: String,
    #[serde(flatten)]
    pub warning: TableParseWarning,
}

/// Result of classifying one document
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<ClassificationWarning>,
    pub table_warnings: Vec<ArtifactTableWarning>,
    /// Total rows dropped for width mismatch across all tables
    pub skipped_rows: usize,
}

/// Type and attribute-definition lookups of one document
#[derive(Debug, Default)]
struct TypeIndex {
    /// SPEC-OBJECT-TYPE identifier -> LONG-NAME
    type_labels: HashMap<String, String>,
    /// ATTRIBUTE-DEFINITION-* identifier -> LONG-NAME
    attribute_names: HashMap<String, String>,
}

impl TypeIndex {
    fn build(root: &RawNode) -> Self {
        let mut index = TypeIndex::default();
        for node in root.descendants() {
            let (Some(id), Some(name)) = (node.identifier(), node.long_name()) else {
                continue;
            };
            if node.name == "SPEC-OBJECT-TYPE" {
                index.type_labels.insert(id.to_string(), name.to_string());
            } else if node.name.starts_with("ATTRIBUTE-DEFINITION-") {
                index.attribute_names.insert(id.to_string(), name.to_string());
            }
        }
        index
    }
}

/// One ATTRIBUTE-VALUE-* of an object, resolved to its definition name
#[derive(Debug)]
enum AttributeValue<'a> {
    Plain(&'a str),
    Markup(&'a RawNode),
}

impl AttributeValue<'_> {
    fn plain_text(&self) -> String {
        match self {
            AttributeValue::Plain(s) => s.trim().to_string(),
            AttributeValue::Markup(node) => collapse(&node.text()),
        }
    }
}

fn collapse(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

fn resolve_values<'a>(object: &'a RawNode, index: &TypeIndex) -> Vec<(String, AttributeValue<'a>)> {
    let Some(values) = object.child("VALUES") else {
        return Vec::new();
    };
    values
        .elements()
        .filter(|v| v.name.starts_with("ATTRIBUTE-VALUE-"))
        .filter_map(|v| {
            let def_ref = v
                .child("DEFINITION")
                .and_then(|d| d.elements().next())
                .map(|r| r.text().trim().to_string())?;
            let name = index
                .attribute_names
                .get(&def_ref)
                .cloned()
                .unwrap_or(def_ref);
            let value = if v.name == "ATTRIBUTE-VALUE-XHTML" {
                AttributeValue::Markup(v.child("THE-VALUE")?)
            } else {
                AttributeValue::Plain(v.attr("THE-VALUE")?)
            };
            Some((name, value))
        })
        .collect()
}

fn find_value<'v, 'a>(
    values: &'v [(String, AttributeValue<'a>)],
    name: &str,
) -> Option<&'v AttributeValue<'a>> {
    values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// @acp:summary "Classify every SPEC-OBJECT of a parsed document"
pub fn classify_document(document: &RawDocument, options: &ExtractOptions) -> Classification {
    classify_root(&document.root, options)
}

/// Classify every SPEC-OBJECT below `root`, in document order.
pub fn classify_root(root: &RawNode, options: &ExtractOptions) -> Classification {
    let index = TypeIndex::build(root);
    let mut result = Classification::default();
    let mut current_heading = NO_HEADING.to_string();

    for (order_index, object) in root.find_all("SPEC-OBJECT").enumerate() {
        let internal_id = match object.identifier() {
            Some(id) => id.to_string(),
            None => {
                let assigned = format!("#{}", order_index);
                let warning = ClassificationWarning::MissingIdentifier {
                    order_index,
                    assigned: assigned.clone(),
                };
                tracing::warn!("{}", warning);
                result.warnings.push(warning);
                assigned
            }
        };

        let type_label = match object.type_ref() {
            Some(type_ref) => match index.type_labels.get(&type_ref) {
                Some(label) => Some(label.clone()),
                None => {
                    let warning = ClassificationWarning::UnknownType {
                        internal_id: internal_id.clone(),
                        type_ref,
                    };
                    tracing::warn!("{}", warning);
                    result.warnings.push(warning);
                    None
                }
            },
            None => None,
        };

        let values = resolve_values(object, &index);

        let human_readable_id = match find_value(&values, FOREIGN_ID_ATTRIBUTE) {
            Some(value) => {
                let candidate = value.plain_text();
                if SHORT_ID.is_match(&candidate) {
                    Some(candidate)
                } else {
                    let warning = ClassificationWarning::RejectedForeignId {
                        internal_id: internal_id.clone(),
                        value: candidate,
                    };
                    tracing::warn!("{}", warning);
                    result.warnings.push(warning);
                    None
                }
            }
            None => None,
        };

        // Fall back to the first XHTML value when the object has no ReqIF.Text
        let content = find_value(&values, TEXT_ATTRIBUTE).or_else(|| {
            values
                .iter()
                .map(|(_, v)| v)
                .find(|v| matches!(v, AttributeValue::Markup(_)))
        });
        let (text, raw_content) = match content {
            Some(AttributeValue::Markup(node)) => (collapse(&node.text()), node.inner_markup()),
            Some(AttributeValue::Plain(s)) => (collapse(s), s.to_string()),
            None => (String::new(), String::new()),
        };

        let input = RuleInput {
            label: type_label.as_deref(),
            text: &text,
            raw_content: &raw_content,
        };
        let artifact_type = match first_match(RULES, &input) {
            Some((rule_index, rule)) => {
                tracing::debug!(
                    id = %internal_id,
                    rule = rule_index,
                    artifact_type = %rule.artifact_type,
                    "Classified object"
                );
                rule.artifact_type
            }
            None => {
                let warning = ClassificationWarning::Unclassified {
                    internal_id: internal_id.clone(),
                    label: type_label.clone(),
                };
                tracing::warn!("{}", warning);
                result.warnings.push(warning);
                ArtifactType::Information
            }
        };

        let heading_text = if artifact_type == ArtifactType::Heading {
            let chapter = find_value(&values, CHAPTER_NAME_ATTRIBUTE)
                .map(AttributeValue::plain_text)
                .filter(|s| !s.is_empty());
            current_heading = chapter
                .or_else(|| Some(text.clone()).filter(|s| !s.is_empty()))
                .unwrap_or_else(|| {
                    human_readable_id
                        .clone()
                        .unwrap_or_else(|| internal_id.clone())
                });
            current_heading.clone()
        } else {
            current_heading.clone()
        };

        let table = if artifact_type == ArtifactType::SystemRequirement {
            let extraction = extract_table(&raw_content, options);
            let artifact_id = human_readable_id
                .clone()
                .unwrap_or_else(|| internal_id.clone());
            result.skipped_rows += extraction.skipped_rows;
            for warning in extraction.warnings {
                tracing::warn!(artifact = %artifact_id, "{}", warning);
                result.table_warnings.push(ArtifactTableWarning {
                    artifact_id: artifact_id.clone(),
                    warning,
                });
            }
            extraction.table
        } else {
            None
        };

        result.artifacts.push(Artifact {
            internal_id,
            human_readable_id,
            artifact_type,
            type_label,
            heading_text,
            text,
            raw_content,
            table,
            order_index,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<REQ-IF xmlns="http://www.omg.org/spec/ReqIF/20110401/reqif.xsd" xmlns:html="http://www.w3.org/1999/xhtml">
  <CORE-CONTENT><REQ-IF-CONTENT>
    <SPEC-TYPES>
      <SPEC-OBJECT-TYPE IDENTIFIER="t-head" LONG-NAME="Heading">
        <SPEC-ATTRIBUTES>
          <ATTRIBUTE-DEFINITION-STRING IDENTIFIER="d-head-id" LONG-NAME="ReqIF.ForeignID"/>
          <ATTRIBUTE-DEFINITION-XHTML IDENTIFIER="d-head-text" LONG-NAME="ReqIF.Text"/>
        </SPEC-ATTRIBUTES>
      </SPEC-OBJECT-TYPE>
      <SPEC-OBJECT-TYPE IDENTIFIER="t-req" LONG-NAME="System Requirements">
        <SPEC-ATTRIBUTES>
          <ATTRIBUTE-DEFINITION-STRING IDENTIFIER="d-req-id" LONG-NAME="ReqIF.ForeignID"/>
          <ATTRIBUTE-DEFINITION-XHTML IDENTIFIER="d-req-text" LONG-NAME="ReqIF.Text"/>
        </SPEC-ATTRIBUTES>
      </SPEC-OBJECT-TYPE>
      <SPEC-OBJECT-TYPE IDENTIFIER="t-odd" LONG-NAME="Vendor Note"/>
    </SPEC-TYPES>
    <SPEC-OBJECTS>
      <SPEC-OBJECT IDENTIFIER="_r0">
        <TYPE><SPEC-OBJECT-TYPE-REF>t-req</SPEC-OBJECT-TYPE-REF></TYPE>
        <VALUES>
          <ATTRIBUTE-VALUE-XHTML>
            <DEFINITION><ATTRIBUTE-DEFINITION-XHTML-REF>d-req-text</ATTRIBUTE-DEFINITION-XHTML-REF></DEFINITION>
            <THE-VALUE><html:p>No table here</html:p></THE-VALUE>
          </ATTRIBUTE-VALUE-XHTML>
        </VALUES>
      </SPEC-OBJECT>
      <SPEC-OBJECT IDENTIFIER="_h1">
        <TYPE><SPEC-OBJECT-TYPE-REF>t-head</SPEC-OBJECT-TYPE-REF></TYPE>
        <VALUES>
          <ATTRIBUTE-VALUE-STRING THE-VALUE="HEAD_1">
            <DEFINITION><ATTRIBUTE-DEFINITION-STRING-REF>d-head-id</ATTRIBUTE-DEFINITION-STRING-REF></DEFINITION>
          </ATTRIBUTE-VALUE-STRING>
          <ATTRIBUTE-VALUE-XHTML>
            <DEFINITION><ATTRIBUTE-DEFINITION-XHTML-REF>d-head-text</ATTRIBUTE-DEFINITION-XHTML-REF></DEFINITION>
            <THE-VALUE><html:p>Door   Control
              System</html:p></THE-VALUE>
          </ATTRIBUTE-VALUE-XHTML>
        </VALUES>
      </SPEC-OBJECT>
      <SPEC-OBJECT IDENTIFIER="_a1b2">
        <TYPE><SPEC-OBJECT-TYPE-REF>t-req</SPEC-OBJECT-TYPE-REF></TYPE>
        <VALUES>
          <ATTRIBUTE-VALUE-STRING THE-VALUE="REQ_DCS_001">
            <DEFINITION><ATTRIBUTE-DEFINITION-STRING-REF>d-req-id</ATTRIBUTE-DEFINITION-STRING-REF></DEFINITION>
          </ATTRIBUTE-VALUE-STRING>
          <ATTRIBUTE-VALUE-XHTML>
            <DEFINITION><ATTRIBUTE-DEFINITION-XHTML-REF>d-req-text</ATTRIBUTE-DEFINITION-XHTML-REF></DEFINITION>
            <THE-VALUE><html:div><html:table>
              <html:tr><html:th>Input1</html:th><html:th>Input2</html:th><html:th>Output1</html:th></html:tr>
              <html:tr><html:td>0</html:td><html:td>0</html:td><html:td>0</html:td></html:tr>
              <html:tr><html:td>1</html:td><html:td>1</html:td><html:td>1</html:td></html:tr>
            </html:table></html:div></THE-VALUE>
          </ATTRIBUTE-VALUE-XHTML>
        </VALUES>
      </SPEC-OBJECT>
      <SPEC-OBJECT IDENTIFIER="_bad">
        <TYPE><SPEC-OBJECT-TYPE-REF>t-req</SPEC-OBJECT-TYPE-REF></TYPE>
        <VALUES>
          <ATTRIBUTE-VALUE-STRING THE-VALUE="not a short id!">
            <DEFINITION><ATTRIBUTE-DEFINITION-STRING-REF>d-req-id</ATTRIBUTE-DEFINITION-STRING-REF></DEFINITION>
          </ATTRIBUTE-VALUE-STRING>
        </VALUES>
      </SPEC-OBJECT>
      <SPEC-OBJECT IDENTIFIER="_odd">
        <TYPE><SPEC-OBJECT-TYPE-REF>t-odd</SPEC-OBJECT-TYPE-REF></TYPE>
      </SPEC-OBJECT>
      <SPEC-OBJECT IDENTIFIER="_ghost">
        <TYPE><SPEC-OBJECT-TYPE-REF>t-missing</SPEC-OBJECT-TYPE-REF></TYPE>
      </SPEC-OBJECT>
    </SPEC-OBJECTS>
  </REQ-IF-CONTENT></CORE-CONTENT>
</REQ-IF>"#;

    fn classify() -> Classification {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        classify_root(&RawNode::from_xml(doc.root_element()), &ExtractOptions::default())
    }

    #[test]
    fn test_one_artifact_per_object_in_order() {
        let result = classify();
        let ids: Vec<&str> = result
            .artifacts
            .iter()
            .map(|a| a.internal_id.as_str())
            .collect();
        assert_eq!(ids, vec!["_r0", "_h1", "_a1b2", "_bad", "_odd", "_ghost"]);
        assert!(result
            .artifacts
            .iter()
            .enumerate()
            .all(|(i, a)| a.order_index == i));
    }

    #[test]
    fn test_heading_propagation() {
        let result = classify();
        assert_eq!(result.artifacts[0].heading_text, NO_HEADING);
        assert_eq!(result.artifacts[1].artifact_type, ArtifactType::Heading);
        assert_eq!(result.artifacts[1].heading_text, "Door Control System");
        assert_eq!(result.artifacts[2].heading_text, "Door Control System");
    }

    #[test]
    fn test_foreign_id_resolution_and_table() {
        let result = classify();
        let req = &result.artifacts[2];
        assert_eq!(req.human_readable_id.as_deref(), Some("REQ_DCS_001"));
        assert_eq!(req.display_id(), "REQ_DCS_001");
        assert_eq!(req.artifact_type, ArtifactType::SystemRequirement);
        let table = req.table.as_ref().unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(req.raw_content.contains("<table>"));
        assert!(result.artifacts[0].table.is_none());
    }

    #[test]
    fn test_rejected_foreign_id_is_left_empty() {
        let result = classify();
        let bad = &result.artifacts[3];
        assert_eq!(bad.human_readable_id, None);
        assert_eq!(bad.display_id(), "_bad");
        assert!(result.warnings.contains(&ClassificationWarning::RejectedForeignId {
            internal_id: "_bad".to_string(),
            value: "not a short id!".to_string(),
        }));
    }

    #[test]
    fn test_unclassifiable_objects_default_to_information() {
        let result = classify();
        assert_eq!(result.artifacts[4].artifact_type, ArtifactType::Information);
        assert_eq!(result.artifacts[5].artifact_type, ArtifactType::Information);
        assert!(result.warnings.contains(&ClassificationWarning::Unclassified {
            internal_id: "_odd".to_string(),
            label: Some("Vendor Note".to_string()),
        }));
        assert!(result.warnings.contains(&ClassificationWarning::UnknownType {
            internal_id: "_ghost".to_string(),
            type_ref: "t-missing".to_string(),
        }));
    }
}
