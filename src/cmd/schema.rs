//! Schema command: export JSON Schemas of the written documents.

use anyhow::{bail, Context, Result};
use schema_diagram::json_schema;
use std::fs;
use std::path::PathBuf;

pub fn run(name: &str, output_dir: Option<PathBuf>) -> Result<()> {
    if let Some(dir) = output_dir {
        fs::create_dir_all(&dir)
            .with_context(|| format!("could not create directory {}", dir.display()))?;
        for (name, schema) in json_schema::all_schemas() {
            let path = dir.join(format!("{}.schema.json", name));
            fs::write(&path, serde_json::to_string_pretty(&schema)?)
                .with_context(|| format!("could not write {}", path.display()))?;
            eprintln!("Schema written to: {}", path.display());
        }
        return Ok(());
    }

    match json_schema::get_schema(name) {
        Some(schema) => {
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        None => bail!(
            "Unknown schema: {}. Valid options: {}",
            name,
            json_schema::schema_names().join(", ")
        ),
    }
}
