//! @acp:module "Inspect Command"
//! @acp:summary "List the classified artifacts of one bundle"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use crate::classify::{classify_document, ArtifactTableWarning, ArtifactType, ClassificationWarning};
use crate::config::Config;
use crate::container::{load_bundle, ContainerNote};
use crate::table::ExtractOptions;

/// Options for the inspect command
#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub bundle: PathBuf,
    pub json: bool,
}

/// One artifact line of the listing
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub order_index: usize,
    pub internal_id: String,
    pub human_readable_id: Option<String>,
    pub artifact_type: ArtifactType,
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_columns: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectOutput {
    pub bundle: PathBuf,
    pub entry: String,
    pub fingerprint: String,
    pub artifacts: Vec<ArtifactSummary>,
    pub container_notes: Vec<ContainerNote>,
    pub classification_warnings: Vec<ClassificationWarning>,
    pub table_warnings: Vec<ArtifactTableWarning>,
}

/// Load and classify a bundle without rendering anything
pub fn inspect_bundle(bundle: &std::path::Path, config: &Config) -> Result<InspectOutput> {
    let document = load_bundle(bundle, &config.namespaces)
        .with_context(|| format!("Failed to load {}", bundle.display()))?;
    let classification = classify_document(&document, &ExtractOptions::from(&config.extraction));

    let artifacts = classification
        .artifacts
        .iter()
        .map(|a| ArtifactSummary {
            order_index: a.order_index,
            internal_id: a.internal_id.clone(),
            human_readable_id: a.human_readable_id.clone(),
            artifact_type: a.artifact_type,
            heading: a.heading_text.clone(),
            table_rows: a.table.as_ref().map(|t| t.row_count()),
            table_columns: a.table.as_ref().map(|t| t.headers().len()),
        })
        .collect();

    Ok(InspectOutput {
        bundle: document.source,
        entry: document.entry_name,
        fingerprint: document.fingerprint,
        artifacts,
        container_notes: document.notes,
        classification_warnings: classification.warnings,
        table_warnings: classification.table_warnings,
    })
}

/// Execute the inspect command
pub fn execute_inspect(options: InspectOptions, config: Config) -> Result<()> {
    let output = inspect_bundle(&options.bundle, &config)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        style("Bundle:").bold(),
        output.bundle.display(),
        output.entry
    );
    println!("  sha256 {}\n", style(&output.fingerprint).dim());

    for a in &output.artifacts {
        let table = match (a.table_rows, a.table_columns) {
            (Some(rows), Some(cols)) => format!("{}x{}", rows, cols),
            _ => "-".to_string(),
        };
        println!(
            "{:>4}  {:20} {:24} {:>6}  {}",
            a.order_index,
            a.artifact_type.as_str(),
            a.human_readable_id.as_deref().unwrap_or(&a.internal_id),
            table,
            style(&a.heading).dim()
        );
    }

    let warnings = output.container_notes.len()
        + output.classification_warnings.len()
        + output.table_warnings.len();
    if warnings > 0 {
        println!("\n{} {} warning(s)", style("⚠").yellow(), warnings);
        for note in &output.container_notes {
            println!("  {}", note);
        }
        for warning in &output.classification_warnings {
            println!("  {}", warning);
        }
        for warning in &output.table_warnings {
            println!("  {}: {}", warning.artifact_id, warning.warning);
        }
    }

    Ok(())
}
