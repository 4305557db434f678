//! @acp:module "Errors"
//! @acp:summary "Error taxonomy for bundle loading, template configuration and rendering"
//! @acp:domain reqif
//! @acp:layer types
//!
//! Document-level failures (`Container`, `SchemaDocumentMissing`,
//! `MalformedDocument`) abort a single bundle. Template configuration
//! errors abort the whole run. Render errors are scoped to one artifact and
//! are collected into the document report instead of being propagated.

use std::path::PathBuf;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ReqifError>;

/// @acp:summary "Errors that abort a bundle or a run"
#[derive(Debug, thiserror::Error)]
pub enum ReqifError {
    /// The bundle is not a readable zip archive
    #[error("{}: not a valid REQIFZ archive: {source}", .path.display())]
    Container {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive holds no `.reqif` entry
    #[error("{}: no .reqif exchange document found in archive", .path.display())]
    SchemaDocumentMissing { path: PathBuf },

    /// The exchange document could not be parsed
    #[error("{}: malformed exchange document: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error(transparent)]
    TemplateConfiguration(#[from] TemplateConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ReqifError {
    /// Bundle path for document-level failures
    pub fn bundle_path(&self) -> Option<&std::path::Path> {
        match self {
            ReqifError::Container { path, .. }
            | ReqifError::SchemaDocumentMissing { path }
            | ReqifError::MalformedDocument { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// @acp:summary "Template catalog defects detected at load time"
#[derive(Debug, thiserror::Error)]
pub enum TemplateConfigError {
    #[error("failed to parse template definitions from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate template name '{name}' (declared again in {origin})")]
    DuplicateTemplate { name: String, origin: String },

    #[error("template '{template}' uses placeholder {{{placeholder}}} that is not declared as a variable")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("template '{template}' has invalid id pattern '{pattern}': {source}")]
    InvalidPattern {
        template: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("default template '{0}' is not defined")]
    UnknownDefault(String),

    #[error("template '{0}' is not defined")]
    UnknownTemplate(String),

    #[error("template catalog is empty")]
    Empty,
}

/// @acp:summary "Required variables could not be resolved for one artifact"
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[error("template '{template}' is missing required variable(s): {}", .missing.join(", "))]
pub struct TemplateRenderError {
    pub template: String,
    pub missing: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_names_variables() {
        let err = TemplateRenderError {
            template: "door_control_specialized".to_string(),
            missing: vec!["row_count".to_string(), "table_str".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "template 'door_control_specialized' is missing required variable(s): row_count, table_str"
        );
    }

    #[test]
    fn test_unresolved_placeholder_message() {
        let err = TemplateConfigError::UnresolvedPlaceholder {
            template: "t".to_string(),
            placeholder: "foo".to_string(),
        };
        assert!(err.to_string().contains("{foo}"));
    }

    #[test]
    fn test_bundle_path_only_for_document_errors() {
        let err = ReqifError::SchemaDocumentMissing {
            path: PathBuf::from("a.reqifz"),
        };
        assert_eq!(err.bundle_path(), Some(std::path::Path::new("a.reqifz")));
        let err = ReqifError::TemplateConfiguration(TemplateConfigError::Empty);
        assert!(err.bundle_path().is_none());
    }
}
