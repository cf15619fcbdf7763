mod generate;
mod schema;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-diagram")]
#[command(version)]
#[command(about = "Generate an interactive entity-relationship diagram from schema definitions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the diagram (self-contained HTML, or the graph document as JSON)
    Generate {
        /// YAML config file (default: schema-diagram.yml in the working directory, if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Declarative schema file (default: db/schema.rb)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// SQL structure dump (default: db/structure.sql)
        #[arg(long)]
        structure: Option<PathBuf>,

        /// Model manifest (YAML); entities are derived from the schema when omitted
        #[arg(long)]
        models: Option<PathBuf>,

        /// Schema source: auto, ruby, sql
        #[arg(long)]
        schema_format: Option<String>,

        /// Theme: auto, light, dark
        #[arg(long)]
        theme: Option<String>,

        /// Page title
        #[arg(long)]
        title: Option<String>,

        /// Show every column instead of the first four
        #[arg(long)]
        expand_columns: bool,

        /// Models to leave out (comma-separated, trailing * matches a prefix)
        #[arg(short, long)]
        exclude: Option<String>,

        /// Output format: html, json (detected from the output extension if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the JSON Schema of the graph document
    Schema {
        /// Schema name
        #[arg(default_value = "graph")]
        name: String,

        /// Write every schema as <name>.schema.json into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            config,
            output,
            schema,
            structure,
            models,
            schema_format,
            theme,
            title,
            expand_columns,
            exclude,
            format,
            verbose,
        } => {
            setup_logging(verbose);
            generate::run(generate::GenerateArgs {
                config,
                output,
                schema,
                structure,
                models,
                schema_format,
                theme,
                title,
                expand_columns,
                exclude,
                format,
            })
        }
        Commands::Schema { name, output_dir } => schema::run(&name, output_dir),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "schema-diagram",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

/// Diagnostics to stderr; `RUST_LOG` wins over the flag
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}
