use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use pcb_refdes::{AnnotationDiagnostic, Severity, Snapshot};

#[derive(ValueEnum, Debug, Clone, Default)]
pub enum CheckFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for CheckFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckFormat::Table => write!(f, "table"),
            CheckFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Check the reference designators of a schematic snapshot")]
pub struct CheckArgs {
    /// Snapshot JSON file
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, default_value_t = CheckFormat::Table)]
    pub format: CheckFormat,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let snapshot = Snapshot::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let mut list = snapshot.flatten()?;

    let mut diagnostics = Vec::new();
    let count = list.check_annotation(&mut diagnostics);
    log::debug!("{count} diagnostic(s) for {} references", list.len());

    let mut writer = io::stdout().lock();
    match args.format {
        CheckFormat::Json => writeln!(writer, "{}", serde_json::to_string_pretty(&diagnostics)?)?,
        CheckFormat::Table if diagnostics.is_empty() => {
            writeln!(writer, "{}", "No annotation problems".green())?
        }
        CheckFormat::Table => write_diagnostic_table(&diagnostics, &mut writer)?,
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("{errors} annotation error(s) in {}", args.file.display());
    }
    Ok(())
}

fn write_diagnostic_table<W: Write>(
    diagnostics: &[AnnotationDiagnostic],
    mut writer: W,
) -> io::Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);

    for d in diagnostics {
        let severity = match d.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        let instances = d
            .instances
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![severity, d.message.as_str(), instances.as_str()]);
    }

    table.set_header(vec!["Severity", "Message", "Instances"]);

    writeln!(writer, "{table}")?;
    Ok(())
}
