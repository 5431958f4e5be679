//! Conversion summary without writing a model.

use std::io::{self, Write};

use anyhow::Result;
use feedr_cli::cli::TableArgs;
use feedr_io::{convert_files, ConvertOptions};
use tabwriter::TabWriter;

pub fn handle(tables: &TableArgs, options: &ConvertOptions) -> Result<()> {
    let result = convert_files(&tables.primary, &tables.secondary, options)?;

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "KIND\tCOUNT")?;
    for (kind, count) in result.model.count_by_kind() {
        writeln!(writer, "{}\t{}", kind, count)?;
    }
    writer.flush()?;

    println!();
    println!("Components: {}", result.components.len());
    for (i, component) in result.components.iter().enumerate() {
        let sources = if component.sources.is_empty() {
            "no source".to_string()
        } else {
            component.sources.join(", ")
        };
        println!("  #{}: {} objects, fed by {}", i, component.members, sources);
    }

    println!();
    print!("{}", result.diagnostics);
    Ok(())
}
