//! @acp:module "Render Command"
//! @acp:summary "Run the pipeline over bundles and write prompt files"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `reqprompt render`. Bundles share no state, so they are
//! processed in parallel against one pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::{CliOverrides, Config};
use crate::pipeline::{ArtifactFailure, CollaboratorRecord, DocumentReport, Pipeline};

/// Bundle file extension
pub const BUNDLE_EXTENSION: &str = "reqifz";

/// Options for the render command
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Bundle file or directory to search
    pub input: PathBuf,
    /// Values that override the project configuration
    pub overrides: CliOverrides,
    /// Worker threads; `None` uses rayon's default
    pub jobs: Option<usize>,
    /// Print full reports as JSON instead of a summary
    pub json: bool,
}

/// Prompt file written next to (or on behalf of) each bundle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFile<'a> {
    pub bundle: &'a Path,
    pub fingerprint: &'a str,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<CollaboratorRecord>,
    pub failures: &'a [ArtifactFailure],
}

impl<'a> From<&'a DocumentReport> for PromptFile<'a> {
    fn from(report: &'a DocumentReport) -> Self {
        Self {
            bundle: &report.bundle,
            fingerprint: &report.fingerprint,
            run_id: report.run_id,
            generated_at: report.generated_at,
            records: report.collaborator_records(),
            failures: &report.failures,
        }
    }
}

/// Bundles at `input`: the file itself, or every `*.reqifz` below a
/// directory in sorted order.
pub fn discover_bundles(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input not found: {}", input.display());
    }

    let mut bundles: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(BUNDLE_EXTENSION))
        })
        .map(|e| e.into_path())
        .collect();
    bundles.sort();
    Ok(bundles)
}

/// Prompt file path of every bundle, in bundle order.
///
/// Fails when two bundles would write the same file (for example
/// `door.reqifz` and `door.REQIFZ` side by side).
pub fn plan_outputs(config: &Config, input: &Path, bundles: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut targets = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        let target = config.output.path_for(bundle, input);
        if let Some(previous) = seen.insert(target.clone(), bundle.as_path()) {
            bail!(
                "Bundles {} and {} would both write {}",
                previous.display(),
                bundle.display(),
                target.display()
            );
        }
        targets.push(target);
    }
    Ok(targets)
}

fn write_prompt_file(path: &Path, report: &DocumentReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(&PromptFile::from(report))?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write prompt file {}", path.display()))?;
    Ok(())
}

/// Outcome of one bundle
struct BundleResult {
    bundle: PathBuf,
    outcome: Result<(DocumentReport, PathBuf)>,
}

/// Execute the render command
pub fn execute_render(options: RenderOptions, mut config: Config) -> Result<()> {
    config.apply_overrides(&options.overrides);
    let pipeline = Pipeline::from_config(config).context("Failed to load template catalog")?;

    let bundles = discover_bundles(&options.input)?;
    if bundles.is_empty() {
        bail!("No .{} bundles found under {}", BUNDLE_EXTENSION, options.input.display());
    }
    let targets = plan_outputs(pipeline.config(), &options.input, &bundles)?;

    if !options.json {
        println!(
            "{} Rendering prompts for {} bundle(s) with {} template(s)",
            style("→").cyan(),
            bundles.len(),
            pipeline.catalog().len()
        );
    }

    let progress = if options.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(bundles.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.unwrap_or(0))
        .build()?;

    let results: Vec<BundleResult> = pool.install(|| {
        bundles
            .par_iter()
            .zip(targets.par_iter())
            .map(|(bundle, target)| {
                progress.set_message(bundle.display().to_string());
                let outcome = pipeline
                    .run(bundle)
                    .map_err(anyhow::Error::from)
                    .and_then(|report| {
                        write_prompt_file(target, &report)?;
                        Ok((report, target.clone()))
                    });
                progress.inc(1);
                BundleResult {
                    bundle: bundle.clone(),
                    outcome,
                }
            })
            .collect()
    });
    progress.finish_and_clear();

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();

    if options.json {
        let reports: Vec<&DocumentReport> = results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|(report, _)| report))
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        for result in &results {
            if let Err(e) = &result.outcome {
                eprintln!("{} {}: {:#}", style("✗").red(), result.bundle.display(), e);
            }
        }
    } else {
        for result in &results {
            print_summary(result);
        }
    }

    if failed > 0 {
        bail!("{} of {} bundle(s) failed", failed, results.len());
    }
    Ok(())
}

fn print_summary(result: &BundleResult) {
    match &result.outcome {
        Ok((report, written)) => {
            println!(
                "{} {} -> {}",
                style("✓").green(),
                result.bundle.display(),
                written.display()
            );
            println!(
                "  Artifacts: {}  Rendered: {}  Skipped: {}  Failed: {}  Warnings: {}",
                report.artifact_count,
                report.rendered_count,
                report.skip_count(),
                report.failures.len(),
                report.warning_count()
            );
            for (reason, count) in &report.skipped {
                println!("    {} {}", style(format!("{:>4}", count)).dim(), reason);
            }
            for failure in &report.failures {
                println!(
                    "  {} {}: {}",
                    style("✗").red(),
                    failure.artifact_id,
                    failure.error
                );
            }
        }
        Err(e) => {
            println!("{} {}: {:#}", style("✗").red(), result.bundle.display(), e);
        }
    }
}
