//! @acp:module "Template Catalog"
//! @acp:summary "Load, merge and validate template definitions once per run"
//! @acp:domain templates
//! @acp:layer io
//!
//! Every structural problem is reported here, at load time: duplicate
//! names, undeclared placeholders, invalid id patterns, unknown default or
//! forced template, empty catalog. A loaded catalog is read-only and is
//! passed explicitly to the selector and renderer.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

use super::types::*;
use crate::config::TemplateSettings;
use crate::error::TemplateConfigError;

/// `{name}` placeholder in a template body
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Origin label of the compiled-in catalog
pub const BUILTIN_ORIGIN: &str = "<builtin>";

const BUILTIN_TEMPLATES: &str = include_str!("../../templates/test_generation.yaml");

/// @acp:summary "Validated set of prompt templates in declaration order"
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<PromptTemplate>,
    default_template: String,
    forced: Option<String>,
    auto_selection: bool,
}

impl TemplateCatalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self, TemplateConfigError> {
        Self::from_sources(&[(BUILTIN_ORIGIN.to_string(), BUILTIN_TEMPLATES.to_string())], &TemplateSettings::default())
    }

    /// Load a single definition document
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, TemplateConfigError> {
        Self::from_sources(&[(origin.to_string(), yaml.to_string())], &TemplateSettings::default())
    }

    /// Load the catalog described by the template settings: the configured
    /// files in order, or the built-in catalog when none are configured.
    pub fn from_settings(settings: &TemplateSettings) -> crate::Result<Self> {
        if settings.files.is_empty() {
            return Ok(Self::from_sources(
                &[(BUILTIN_ORIGIN.to_string(), BUILTIN_TEMPLATES.to_string())],
                settings,
            )?);
        }
        Self::load_files(&settings.files, settings)
    }

    /// Load and merge several definition files
    pub fn load_files(paths: &[PathBuf], settings: &TemplateSettings) -> crate::Result<Self> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(path)?;
            sources.push((origin_of(path), text));
        }
        Ok(Self::from_sources(&sources, settings)?)
    }

    /// Merge `(origin, yaml)` sources in order. Later files may replace the
    /// default template; a template name may only be declared once.
    pub fn from_sources(
        sources: &[(String, String)],
        settings: &TemplateSettings,
    ) -> Result<Self, TemplateConfigError> {
        let mut templates: Vec<PromptTemplate> = Vec::new();
        let mut default_template: Option<String> = None;
        let mut auto_selection = settings.auto_selection;

        for (origin, yaml) in sources {
            let file: TemplateFile =
                serde_yaml::from_str(yaml).map_err(|source| TemplateConfigError::Parse {
                    origin: origin.clone(),
                    source,
                })?;

            if let Some(name) = file.default_template {
                default_template = Some(name);
            }
            if file.auto_selection == Some(false) {
                auto_selection = false;
            }
            let file_case = file.case_sensitive.unwrap_or(settings.case_sensitive);

            for (name, definition) in file.templates {
                if templates.iter().any(|t| t.name == name) {
                    return Err(TemplateConfigError::DuplicateTemplate {
                        name,
                        origin: origin.clone(),
                    });
                }
                templates.push(compile(name, definition, origin, file_case)?);
            }
        }

        if templates.is_empty() {
            return Err(TemplateConfigError::Empty);
        }

        let default_template = match default_template {
            Some(name) => {
                if !templates.iter().any(|t| t.name == name) {
                    return Err(TemplateConfigError::UnknownDefault(name));
                }
                name
            }
            None => {
                let first = templates[0].name.clone();
                tracing::warn!("No default_template declared, using '{}'", first);
                first
            }
        };

        if let Some(ref forced) = settings.forced {
            if !templates.iter().any(|t| &t.name == forced) {
                return Err(TemplateConfigError::UnknownTemplate(forced.clone()));
            }
        }

        tracing::debug!(
            count = templates.len(),
            default = %default_template,
            "Loaded template catalog"
        );

        Ok(Self {
            templates,
            default_template,
            forced: settings.forced.clone(),
            auto_selection,
        })
    }

    /// Templates in declaration order
    pub fn templates(&self) -> &[PromptTemplate] {
        &self.templates
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Position of a template in declaration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.templates.iter().position(|t| t.name == name)
    }

    pub fn default_template(&self) -> &PromptTemplate {
        // validated on construction
        self.get(&self.default_template)
            .unwrap_or(&self.templates[0])
    }

    pub fn forced(&self) -> Option<&PromptTemplate> {
        self.forced.as_deref().and_then(|name| self.get(name))
    }

    pub fn auto_selection(&self) -> bool {
        self.auto_selection
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// @acp:summary "Listing of all templates"
    pub fn list(&self) -> Vec<TemplateInfo> {
        self.templates
            .iter()
            .map(|t| TemplateInfo {
                name: t.name.clone(),
                title: t.title.clone(),
                category: t.category.clone(),
                tags: t.tags.clone(),
                required: t.required_variables.clone(),
                optional: t.optional_variables.clone(),
                id_patterns: t.rules.id_patterns.iter().map(|p| p.as_str().to_string()).collect(),
                keywords: t.rules.keywords.clone(),
                is_default: t.name == self.default_template,
                origin: t.origin.clone(),
            })
            .collect()
    }
}

fn origin_of(path: &Path) -> String {
    path.display().to_string()
}

/// Distinct placeholder names of a body, in order of first appearance
pub fn placeholders(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(body) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn compile(
    name: String,
    definition: TemplateDefinition,
    origin: &str,
    file_case_sensitive: bool,
) -> Result<PromptTemplate, TemplateConfigError> {
    let case_sensitive = definition
        .selection
        .case_sensitive
        .unwrap_or(file_case_sensitive);

    let mut id_patterns = Vec::with_capacity(definition.selection.id_patterns.len());
    for pattern in &definition.selection.id_patterns {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| TemplateConfigError::InvalidPattern {
                template: name.clone(),
                pattern: pattern.clone(),
                source,
            })?;
        id_patterns.push(regex);
    }

    let defaults: IndexMap<String, String> = definition
        .variables
        .defaults
        .iter()
        .map(|(k, v)| (k.clone(), scalar_to_string(v)))
        .collect();

    let template = PromptTemplate {
        placeholders: placeholders(&definition.template),
        name,
        title: definition.name,
        description: definition.description,
        category: definition.category,
        tags: definition.tags,
        required_variables: definition.variables.required,
        optional_variables: definition.variables.optional,
        defaults,
        body: definition.template,
        rules: SelectionRules {
            id_patterns,
            keywords: definition.selection.keywords,
            case_sensitive,
        },
        origin: origin.to_string(),
    };

    if let Some(undeclared) = template.placeholders.iter().find(|p| !template.declares(p)) {
        return Err(TemplateConfigError::UnresolvedPlaceholder {
            template: template.name.clone(),
            placeholder: undeclared.clone(),
        });
    }

    for required in &template.required_variables {
        if !template.placeholders.contains(required) {
            tracing::warn!(
                template = %template.name,
                "Required variable '{}' has no placeholder in the body",
                required
            );
        }
    }

    Ok(template)
}
