//! @acp:module "Pipeline Orchestrator"
//! @acp:summary "Sequence loading, classification, extraction and rendering for one bundle"
//! @acp:domain reqif
//! @acp:layer service
//!
//! One run owns its document and artifacts exclusively. A [`Pipeline`]
//! holds only read-only configuration and the template catalog, so one
//! instance can serve many bundles in parallel.

pub mod report;

use std::path::Path;

use crate::classify::{classify_document, Artifact, ArtifactType};
use crate::config::Config;
use crate::container::{load_bundle, load_bundle_bytes, RawDocument};
use crate::error::{Result, TemplateRenderError};
use crate::table::{format_table, ColumnRole, ExtractOptions};
use crate::template::{render, select, RenderedPrompt, SelectionInput, TemplateCatalog, VariableBag};

pub use report::{
    ArtifactFailure, ArtifactOutcome, CollaboratorRecord, DocumentReport, Outcome,
    RenderedArtifact, ReportWarnings, SkipReason,
};

/// @acp:summary "Variables derived from one artifact and its table"
pub fn artifact_variables(artifact: &Artifact) -> VariableBag {
    let mut bag = VariableBag::new();
    bag.insert("heading", artifact.heading_text.as_str())
        .insert("requirement_id", artifact.display_id())
        .insert("internal_id", artifact.internal_id.as_str())
        .insert("artifact_type", artifact.artifact_type.as_str());

    if let Some(ref table) = artifact.table {
        bag.insert("table_str", format_table(table))
            .insert("row_count", table.row_count().to_string())
            .insert("headers", table.headers().join(", "))
            .insert("input_columns", table.columns_with(ColumnRole::Input).join(", "))
            .insert("output_columns", table.columns_with(ColumnRole::Output).join(", "));
    }
    bag
}

/// Running document context handed to every rendered requirement
#[derive(Debug, Default)]
struct DocumentContext {
    info_since_heading: Vec<String>,
    interfaces: String,
}

impl DocumentContext {
    fn new(artifacts: &[Artifact]) -> Self {
        let interfaces = artifacts
            .iter()
            .filter(|a| a.artifact_type == ArtifactType::SystemInterface)
            .map(|a| format!("- {}: {}", a.display_id(), a.text))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            info_since_heading: Vec::new(),
            interfaces,
        }
    }

    fn variables(&self, voltage_precondition: &str) -> VariableBag {
        let mut bag = VariableBag::new();
        bag.insert("info_str", self.info_since_heading.join("\n"))
            .insert("interface_str", self.interfaces.as_str())
            .insert("voltage_precondition", voltage_precondition.replace('\n', "\\n"));
        bag
    }
}

/// @acp:summary "Per-run orchestrator over a fixed configuration and catalog"
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    catalog: TemplateCatalog,
}

impl Pipeline {
    pub fn new(config: Config, catalog: TemplateCatalog) -> Self {
        Self { config, catalog }
    }

    /// Build a pipeline, loading the catalog the configuration names
    pub fn from_config(config: Config) -> Result<Self> {
        let catalog = TemplateCatalog::from_settings(&config.templates)?;
        Ok(Self::new(config, catalog))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// @acp:summary "Run the full pipeline over a bundle on disk"
    pub fn run(&self, path: &Path) -> Result<DocumentReport> {
        let document = load_bundle(path, &self.config.namespaces)?;
        Ok(self.run_document(document))
    }

    /// Run over a bundle already in memory
    pub fn run_bytes(&self, path: &Path, bytes: &[u8]) -> Result<DocumentReport> {
        let document = load_bundle_bytes(path, bytes, &self.config.namespaces)?;
        Ok(self.run_document(document))
    }

    /// Select and render a template for one artifact.
    ///
    /// `context` supplies document-level variables; artifact variables take
    /// precedence over it.
    pub fn render_artifact(
        &self,
        artifact: &Artifact,
        context: &VariableBag,
    ) -> std::result::Result<RenderedArtifact, TemplateRenderError> {
        let selection = select(&self.catalog, &SelectionInput::from(artifact));

        let mut bag = context.clone();
        bag.extend(&artifact_variables(artifact));

        let text = render(selection.template, &bag)?;
        Ok(RenderedArtifact {
            prompt: RenderedPrompt {
                template: selection.template.name.clone(),
                confidence: selection.confidence,
                reason: selection.reason,
                text,
            },
            required_row_count: artifact.table.as_ref().map_or(0, |t| t.row_count()),
        })
    }

    /// Classify, extract and render a parsed document.
    pub fn run_document(&self, document: RawDocument) -> DocumentReport {
        let options = ExtractOptions::from(&self.config.extraction);
        let classification = classify_document(&document, &options);

        let mut report = DocumentReport::new(document.source, document.fingerprint);
        report.warnings.container = document.notes;
        report.warnings.classification = classification.warnings;
        report.warnings.table = classification.table_warnings;
        report.skipped_rows = classification.skipped_rows;

        let mut context = DocumentContext::new(&classification.artifacts);
        let voltage = &self.config.context.voltage_precondition;

        for artifact in classification.artifacts {
            let outcome = match artifact.artifact_type {
                ArtifactType::Heading => {
                    context.info_since_heading.clear();
                    Outcome::Skipped {
                        reason: SkipReason::PassThrough,
                    }
                }
                ArtifactType::Information => {
                    if !artifact.text.is_empty() {
                        context.info_since_heading.push(format!("- {}", artifact.text));
                    }
                    Outcome::Skipped {
                        reason: SkipReason::PassThrough,
                    }
                }
                ArtifactType::SystemInterface => Outcome::Skipped {
                    reason: SkipReason::PassThrough,
                },
                ArtifactType::SystemRequirement => match artifact.table {
                    None => Outcome::Skipped {
                        reason: SkipReason::NoTableFound,
                    },
                    Some(ref table)
                        if table.row_count() == 0 && self.config.extraction.skip_empty_tables =>
                    {
                        Outcome::Skipped {
                            reason: SkipReason::EmptyTable,
                        }
                    }
                    Some(_) => {
                        let rendered = self.render_artifact(&artifact, &context.variables(voltage));
                        context.info_since_heading.clear();
                        match rendered {
                            Ok(rendered) => Outcome::Rendered(rendered),
                            Err(error) => {
                                tracing::warn!(artifact = %artifact.display_id(), "{}", error);
                                Outcome::Failed(error)
                            }
                        }
                    }
                },
            };

            match &outcome {
                Outcome::Rendered(r) => tracing::debug!(
                    artifact = %artifact.display_id(),
                    template = %r.prompt.template,
                    confidence = %r.prompt.confidence,
                    rows = r.required_row_count,
                    "Rendered prompt"
                ),
                Outcome::Skipped { reason } => tracing::debug!(
                    artifact = %artifact.display_id(),
                    "Skipped: {}",
                    reason
                ),
                Outcome::Failed(_) => {}
            }

            report.record(artifact, outcome);
        }

        tracing::info!(
            bundle = %report.bundle.display(),
            artifacts = report.artifact_count,
            rendered = report.rendered_count,
            skipped = report.skip_count(),
            failed = report.failures.len(),
            warnings = report.warning_count(),
            "Processed bundle"
        );

        report
    }
}
