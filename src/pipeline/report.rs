//! @acp:module "Document Report"
//! @acp:summary "Per-bundle outcome report and collaborator records"
//! @acp:domain reqif
//! @acp:layer output

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::classify::{Artifact, ArtifactTableWarning, ClassificationWarning};
use crate::container::ContainerNote;
use crate::error::TemplateRenderError;
use crate::template::{Confidence, RenderedPrompt};

/// @acp:summary "Why an artifact produced no prompt"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// System requirement without a recognised logic table
    NoTableFound,
    /// Logic table with zero data rows
    EmptyTable,
    /// Heading, information or interface; used as context only
    PassThrough,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::NoTableFound => "no table found",
            SkipReason::EmptyTable => "empty table",
            SkipReason::PassThrough => "context only",
        })
    }
}

/// A prompt ready for the generation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedArtifact {
    #[serde(flatten)]
    pub prompt: RenderedPrompt,
    /// Test cases the collaborator must return, one per table row
    pub required_row_count: usize,
}

/// @acp:summary "What happened to one artifact"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Rendered(RenderedArtifact),
    Skipped { reason: SkipReason },
    Failed(TemplateRenderError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactOutcome {
    pub artifact: Artifact,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFailure {
    pub artifact_id: String,
    pub error: String,
}

/// Recovered problems of one document, by origin
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportWarnings {
    pub container: Vec<ContainerNote>,
    pub classification: Vec<ClassificationWarning>,
    pub table: Vec<ArtifactTableWarning>,
}

impl ReportWarnings {
    pub fn len(&self) -> usize {
        self.container.len() + self.classification.len() + self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Input record for the generation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CollaboratorRecord {
    Prompt {
        artifact_id: String,
        rendered_prompt: String,
        required_row_count: usize,
        template: String,
        confidence: Confidence,
    },
    Skip {
        artifact_id: String,
        skip_reason: SkipReason,
    },
}

/// @acp:summary "Full result of one pipeline run over one bundle"
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub bundle: PathBuf,
    pub fingerprint: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub artifact_count: usize,
    pub rendered_count: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Rows dropped for width mismatch across all tables
    pub skipped_rows: usize,
    pub failures: Vec<ArtifactFailure>,
    pub warnings: ReportWarnings,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl DocumentReport {
    pub(crate) fn new(bundle: PathBuf, fingerprint: String) -> Self {
        Self {
            bundle,
            fingerprint,
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            artifact_count: 0,
            rendered_count: 0,
            skipped: BTreeMap::new(),
            skipped_rows: 0,
            failures: Vec::new(),
            warnings: ReportWarnings::default(),
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, artifact: Artifact, outcome: Outcome) {
        match &outcome {
            Outcome::Rendered(_) => self.rendered_count += 1,
            Outcome::Skipped { reason } => *self.skipped.entry(*reason).or_insert(0) += 1,
            Outcome::Failed(error) => self.failures.push(ArtifactFailure {
                artifact_id: artifact.display_id().to_string(),
                error: error.to_string(),
            }),
        }
        self.artifact_count += 1;
        self.outcomes.push(ArtifactOutcome { artifact, outcome });
    }

    /// Total skipped artifacts over all reasons
    pub fn skip_count(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skip_count_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Records for the generation collaborator, in document order.
    /// Failed artifacts are reported in `failures` only.
    pub fn collaborator_records(&self) -> Vec<CollaboratorRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                let artifact_id = o.artifact.display_id().to_string();
                match &o.outcome {
                    Outcome::Rendered(rendered) => Some(CollaboratorRecord::Prompt {
                        artifact_id,
                        rendered_prompt: rendered.prompt.text.clone(),
                        required_row_count: rendered.required_row_count,
                        template: rendered.prompt.template.clone(),
                        confidence: rendered.prompt.confidence,
                    }),
                    Outcome::Skipped { reason } => Some(CollaboratorRecord::Skip {
                        artifact_id,
                        skip_reason: *reason,
                    }),
                    Outcome::Failed(_) => None,
                }
            })
            .collect()
    }
}
