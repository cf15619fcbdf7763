//! Generate command implementation.

use anyhow::{anyhow, bail, Result};
use schema_diagram::config::Config;
use schema_diagram::generator::Generator;
use schema_diagram::graph::OutputFormat;
use std::path::{Path, PathBuf};

/// Command-line values; every one overrides the config file
pub struct GenerateArgs {
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub structure: Option<PathBuf>,
    pub models: Option<PathBuf>,
    pub schema_format: Option<String>,
    pub theme: Option<String>,
    pub title: Option<String>,
    pub expand_columns: bool,
    pub exclude: Option<String>,
    pub format: Option<String>,
}

/// Run the generate command
pub fn run(args: GenerateArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let format = config.format;
    let generator = Generator::new(config);

    let doc = generator.document()?;
    let path = generator.write(&doc)?;

    match format {
        OutputFormat::Html => eprintln!("Schema diagram generated: {}", path.display()),
        OutputFormat::Json => eprintln!("Graph document written to: {}", path.display()),
    }
    eprintln!(
        "{} models, {} columns, {} associations",
        doc.nodes.len(),
        doc.column_count(),
        doc.edges.len()
    );

    Ok(())
}

/// Merge the config file (explicit or discovered) with the flags
fn resolve_config(args: GenerateArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file does not exist: {}", path.display());
            }
            Config::load(path)?
        }
        None => Config::discover(Path::new("."))?.unwrap_or_default(),
    };

    for (flag, path) in [("--schema", &args.schema), ("--structure", &args.structure)] {
        if let Some(path) = path {
            if !path.exists() {
                bail!("{} file does not exist: {}", flag, path.display());
            }
        }
    }

    if let Some(path) = args.schema {
        config.schema_path = path;
    }
    if let Some(path) = args.structure {
        config.structure_path = path;
    }
    if let Some(path) = args.models {
        config.models_path = Some(path);
    }
    if let Some(ref f) = args.schema_format {
        config.schema_format = f.parse().map_err(|e| anyhow!("{}", e))?;
    }
    if let Some(ref t) = args.theme {
        config.theme = t.parse().map_err(|e| anyhow!("{}", e))?;
    }
    if let Some(title) = args.title {
        config.title = title;
    }
    if args.expand_columns {
        config.expand_columns = true;
    }
    if let Some(exclude) = args.exclude {
        config.exclude_models.extend(
            exclude
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }

    // Format: explicit flag, then the output extension, then the config value
    if let Some(ref f) = args.format {
        config.format = f.parse().map_err(|e| anyhow!("{}", e))?;
    } else if let Some(detected) = args
        .output
        .as_ref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
    {
        config.format = detected;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }

    Ok(config)
}
