#![forbid(unsafe_code)]

//! @acp:module "ReqIF Prompt Library"
//! @acp:summary "Turn REQIFZ requirement bundles into test generation prompts"
//! @acp:domain reqif
//! @acp:layer api
//! @acp:stability experimental
//!
//! # reqprompt
//!
//! Reads REQIFZ bundles (zip archives holding a ReqIF exchange document),
//! classifies every specification object, extracts the logic tables of
//! system requirements and renders one prompt per requirement from a YAML
//! template catalog.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reqprompt::{Config, Pipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::from_config(Config::default())?;
//!     let report = pipeline.run("door_window.reqifz".as_ref())?;
//!
//!     for record in report.collaborator_records() {
//!         println!("{}", serde_json::to_string(&record)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod commands;
pub mod config;
pub mod container;
pub mod error;
pub mod pipeline;
pub mod table;
pub mod template;

// Re-exports
pub use classify::{classify_document, Artifact, ArtifactType, Classification};
pub use config::Config;
pub use container::{load_bundle, load_bundle_bytes, RawDocument};
pub use error::{ReqifError, Result, TemplateConfigError, TemplateRenderError};
pub use pipeline::{CollaboratorRecord, DocumentReport, Outcome, Pipeline, SkipReason};
pub use table::{extract_table, format_table, parse_formatted_table, ColumnRole, Table};
pub use template::{select, Confidence, PromptTemplate, TemplateCatalog, VariableBag};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
