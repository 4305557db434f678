//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Each command is in its own submodule.

pub mod inspect;
pub mod render;
pub mod templates;

pub use inspect::{execute_inspect, inspect_bundle, ArtifactSummary, InspectOptions, InspectOutput};
pub use render::{
    discover_bundles, execute_render, plan_outputs, PromptFile, RenderOptions, BUNDLE_EXTENSION,
};
pub use templates::{execute_templates, TemplatesSubcommand};
