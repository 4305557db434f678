//! @acp:module "Templates Command"
//! @acp:summary "List, validate and trial-select prompt templates"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::template::{candidates, select, Confidence, SelectionInput, SelectionReason, TemplateCatalog};

/// Templates subcommands
#[derive(Debug, Clone)]
pub enum TemplatesSubcommand {
    /// List templates of the configured catalog
    List { json: bool },
    /// Load template files and report problems
    Validate { files: Vec<PathBuf> },
    /// Show which template a heading and id would select
    Select {
        heading: String,
        id: Option<String>,
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct CandidateView<'a> {
    template: &'a str,
    confidence: Confidence,
    reason: &'a SelectionReason,
}

#[derive(Debug, Serialize)]
struct SelectView<'a> {
    heading: &'a str,
    id: &'a str,
    selected: CandidateView<'a>,
    candidates: Vec<CandidateView<'a>>,
}

/// Execute a templates subcommand
pub fn execute_templates(cmd: TemplatesSubcommand, config: Config) -> Result<()> {
    match cmd {
        TemplatesSubcommand::List { json } => list(&config, json),
        TemplatesSubcommand::Validate { files } => validate(&config, files),
        TemplatesSubcommand::Select { heading, id, json } => {
            trial_select(&config, &heading, id.as_deref(), json)
        }
    }
}

fn load_catalog(config: &Config) -> Result<TemplateCatalog> {
    TemplateCatalog::from_settings(&config.templates).context("Failed to load template catalog")
}

fn list(config: &Config, json: bool) -> Result<()> {
    let catalog = load_catalog(config)?;
    let infos = catalog.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("{} {} template(s)\n", style("→").cyan(), infos.len());
    for info in &infos {
        let marker = if info.is_default {
            style(" (default)").green().to_string()
        } else {
            String::new()
        };
        println!("  {}{}", style(&info.name).bold(), marker);
        if let Some(ref title) = info.title {
            println!("    {}", title);
        }
        println!("    required: {}", info.required.join(", "));
        if !info.id_patterns.is_empty() {
            println!("    id patterns: {}", info.id_patterns.join(", "));
        }
        if !info.keywords.is_empty() {
            println!("    keywords: {}", info.keywords.join(", "));
        }
        println!("    {}", style(&info.origin).dim());
    }
    Ok(())
}

fn validate(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    let files = if files.is_empty() {
        config.templates.files.clone()
    } else {
        files
    };

    let catalog = if files.is_empty() {
        TemplateCatalog::builtin()?
    } else {
        TemplateCatalog::load_files(&files, &config.templates)?
    };

    println!(
        "{} {} template(s) valid, default '{}'",
        style("✓").green(),
        catalog.len(),
        catalog.default_template().name
    );
    for template in catalog.templates() {
        let undeclared_required: Vec<&str> = template
            .required_variables
            .iter()
            .filter(|v| !template.placeholders.contains(v))
            .map(String::as_str)
            .collect();
        if !undeclared_required.is_empty() {
            println!(
                "  {} {}: required but unused: {}",
                style("⚠").yellow(),
                template.name,
                undeclared_required.join(", ")
            );
        }
    }
    Ok(())
}

fn trial_select(config: &Config, heading: &str, id: Option<&str>, json: bool) -> Result<()> {
    let catalog = load_catalog(config)?;
    let input = SelectionInput {
        heading,
        human_readable_id: id,
        internal_id: "",
    };
    let selection = select(&catalog, &input);
    let matches = candidates(&catalog, &input);

    if json {
        let view = SelectView {
            heading,
            id: input.id(),
            selected: CandidateView {
                template: &selection.template.name,
                confidence: selection.confidence,
                reason: &selection.reason,
            },
            candidates: matches
                .iter()
                .map(|c| CandidateView {
                    template: &c.template.name,
                    confidence: c.confidence,
                    reason: &c.reason,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "{} {} ({} confidence: {})",
        style("→").cyan(),
        style(&selection.template.name).bold(),
        selection.confidence,
        selection.reason
    );
    if matches.len() > 1 {
        println!("\n  Other candidates:");
        for c in matches.iter().filter(|c| c.template.name != selection.template.name) {
            println!("    {} {} ({})", c.template.name, c.confidence, c.reason);
        }
    }
    Ok(())
}
