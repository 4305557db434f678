#![forbid(unsafe_code)]
//! ReqIF prompt extraction command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reqprompt::commands::{
    execute_inspect, execute_render, execute_templates, InspectOptions, RenderOptions,
    TemplatesSubcommand,
};
use reqprompt::config::{CliOverrides, DEFAULT_CONFIG_FILE};
use reqprompt::Config;

#[derive(Parser)]
#[command(name = "reqprompt")]
#[command(about = "Extract logic tables from REQIFZ bundles and render test generation prompts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render prompts for one bundle or every bundle under a directory
    Render {
        /// Bundle file or directory
        input: PathBuf,

        /// Directory for prompt files (default: next to each bundle)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Template definition files (can specify multiple)
        #[arg(long = "templates")]
        templates: Vec<PathBuf>,

        /// Use this template for every artifact
        #[arg(long)]
        template: Option<String>,

        /// Match keywords and id patterns case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Always use the default template
        #[arg(long)]
        no_auto_select: bool,

        /// Worker threads (default: one per core)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print full reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the classified artifacts of a bundle
    Inspect {
        /// Bundle file
        bundle: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage prompt templates
    Templates {
        #[command(subcommand)]
        cmd: TemplatesCommands,
    },
}

#[derive(Subcommand)]
enum TemplatesCommands {
    /// List templates of the configured catalog
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate template definition files
    Validate {
        /// Files to validate (default: configured files or the built-in catalog)
        files: Vec<PathBuf>,
    },
    /// Show which template a heading and id would select
    Select {
        /// Heading text
        #[arg(long)]
        heading: String,

        /// Human-readable requirement id
        #[arg(long)]
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Render {
            input,
            output,
            templates,
            template,
            case_sensitive,
            no_auto_select,
            jobs,
            json,
        } => {
            let options = RenderOptions {
                input,
                overrides: CliOverrides {
                    template_files: templates,
                    template,
                    case_sensitive,
                    no_auto_select,
                    output_dir: output,
                },
                jobs,
                json,
            };
            execute_render(options, config)?;
        }

        Commands::Inspect { bundle, json } => {
            execute_inspect(InspectOptions { bundle, json }, config)?;
        }

        Commands::Templates { cmd } => {
            let subcommand = match cmd {
                TemplatesCommands::List { json } => TemplatesSubcommand::List { json },
                TemplatesCommands::Validate { files } => TemplatesSubcommand::Validate { files },
                TemplatesCommands::Select { heading, id, json } => {
                    TemplatesSubcommand::Select { heading, id, json }
                }
            };
            execute_templates(subcommand, config)?;
        }
    }

    Ok(())
}
