use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use feedr_cli::cli::TableArgs;
use feedr_io::{convert_files, ConvertOptions};
use tracing::info;

pub fn handle(
    tables: &TableArgs,
    out: Option<&Path>,
    strict: bool,
    options: &ConvertOptions,
) -> Result<()> {
    info!(
        primary = %tables.primary.display(),
        secondary = %tables.secondary.display(),
        "converting"
    );
    let result = convert_files(&tables.primary, &tables.secondary, options)?;
    let json = serde_json::to_string_pretty(&result.model).context("serializing model")?;

    match out {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("writing model to '{}'", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    let stats = &result.diagnostics.stats;
    eprintln!(
        "Converted {} records into {} objects and {} configurations",
        stats.records, stats.objects, stats.configs
    );
    eprintln!("{}", result.diagnostics.summary());

    if strict && result.diagnostics.has_errors() {
        for issue in result
            .diagnostics
            .issues
            .iter()
            .filter(|i| i.severity == feedr_core::Severity::Error)
        {
            eprintln!("  {}", issue);
        }
        bail!(
            "conversion reported {} errors (--strict)",
            result.diagnostics.error_count()
        );
    }
    Ok(())
}
