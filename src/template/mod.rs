//! @acp:module "Templates"
//! @acp:summary "Prompt template catalog, selection and rendering"
//! @acp:domain templates
//! @acp:layer logic

pub mod catalog;
pub mod renderer;
pub mod selector;
pub mod types;

pub use catalog::{placeholders, TemplateCatalog, BUILTIN_ORIGIN};
pub use renderer::{render, RenderedPrompt, VariableBag};
pub use selector::{candidates, select, Candidate, Confidence, Selection, SelectionInput, SelectionReason};
pub use types::{PromptTemplate, SelectionRules, TemplateInfo};
