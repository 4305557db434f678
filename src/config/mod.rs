//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default project configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".reqprompt.config.json";

/// @acp:summary "Main configuration structure"
/// @acp:lock normal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Expected XML namespaces of the exchange document
    #[serde(default)]
    pub namespaces: NamespaceConfig,

    /// Template catalog sources and selection behaviour
    #[serde(default)]
    pub templates: TemplateSettings,

    /// Table extraction limits
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Static values exposed to templates
    #[serde(default)]
    pub context: StaticContext,

    /// Output paths
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// @acp:summary "Load config from a JSON file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @acp:summary "Load from default location or fall back to defaults"
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Apply command-line overrides on top of file values
    pub fn apply_overrides(&mut self, cli: &CliOverrides) {
        if !cli.template_files.is_empty() {
            self.templates.files = cli.template_files.clone();
        }
        if let Some(ref name) = cli.template {
            self.templates.forced = Some(name.clone());
        }
        if cli.case_sensitive {
            self.templates.case_sensitive = true;
        }
        if cli.no_auto_select {
            self.templates.auto_selection = false;
        }
        if let Some(ref dir) = cli.output_dir {
            self.output.directory = Some(dir.clone());
        }
    }
}

/// Command-line overrides, applied after the project file
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub template_files: Vec<PathBuf>,
    pub template: Option<String>,
    pub case_sensitive: bool,
    pub no_auto_select: bool,
    pub output_dir: Option<PathBuf>,
}

/// @acp:summary "Namespace URIs of the exchange format"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    #[serde(default = "default_reqif_ns")]
    pub reqif: String,
    #[serde(default = "default_xhtml_ns")]
    pub xhtml: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            reqif: default_reqif_ns(),
            xhtml: default_xhtml_ns(),
        }
    }
}

fn default_reqif_ns() -> String {
    "http://www.omg.org/spec/ReqIF/20110401/reqif.xsd".to_string()
}

fn default_xhtml_ns() -> String {
    "http://www.w3.org/1999/xhtml".to_string()
}

/// @acp:summary "Template catalog sources and selection switches"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    /// Template definition files; empty selects the built-in catalog
    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Template that bypasses rule-based selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced: Option<String>,

    /// Default case sensitivity of keyword and id rules
    #[serde(default)]
    pub case_sensitive: bool,

    /// When false every artifact receives the default template
    #[serde(default = "default_true")]
    pub auto_selection: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            forced: None,
            case_sensitive: false,
            auto_selection: true,
        }
    }
}

/// @acp:summary "Table extraction behaviour"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Zero-row tables yield a skip instead of a prompt
    #[serde(default = "default_true")]
    pub skip_empty_tables: bool,

    /// Upper bound of data rows kept per table
    #[serde(default = "default_max_rows")]
    pub max_table_rows: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            skip_empty_tables: true,
            max_table_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> usize {
    100
}

fn default_true() -> bool {
    true
}

/// @acp:summary "Static test-bench values passed to every prompt"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticContext {
    #[serde(default = "default_voltage_precondition")]
    pub voltage_precondition: String,
}

impl Default for StaticContext {
    fn default() -> Self {
        Self {
            voltage_precondition: default_voltage_precondition(),
        }
    }
}

fn default_voltage_precondition() -> String {
    "1. Voltage= 12V\n2. Bat-ON".to_string()
}

/// @acp:summary "Where prompt files are written"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Output directory; `None` writes next to each bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Suffix appended to the bundle stem
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            suffix: default_suffix(),
        }
    }
}

fn default_suffix() -> String {
    "_prompts.json".to_string()
}

impl OutputConfig {
    /// Prompt file path for a bundle found below `input_root`.
    ///
    /// With an output directory the bundle's subdirectory relative to
    /// `input_root` is kept, so equally named bundles in different folders
    /// get distinct prompt files.
    pub fn path_for(&self, bundle: &Path, input_root: &Path) -> PathBuf {
        let stem = bundle
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());
        let file_name = format!("{}{}", stem, self.suffix);
        match &self.directory {
            Some(dir) => {
                let relative = bundle
                    .parent()
                    .and_then(|parent| parent.strip_prefix(input_root).ok())
                    .unwrap_or_else(|| Path::new(""));
                dir.join(relative).join(file_name)
            }
            None => bundle.with_file_name(file_name),
        }
    }
}
