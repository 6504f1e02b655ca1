use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pcb_refdes::{AnnotateOptions, LogSink, NumberingScheme, Reference, Snapshot, shorthand};

use crate::Order;

#[derive(Args, Debug, Clone)]
#[command(about = "Assign numbers to unannotated references in a schematic snapshot")]
pub struct AnnotateArgs {
    /// Snapshot JSON file
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Annotation options (TOML)
    #[arg(short, long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Number each sheet in its own block (sheet 2 starts at 201)
    #[arg(long)]
    pub per_sheet: bool,

    /// Block size for --per-sheet
    #[arg(long, value_name = "N")]
    pub sheet_interval: Option<u32>,

    /// First number for sequential numbering
    #[arg(long, value_name = "N")]
    pub start: Option<u32>,

    /// Order in which references are numbered
    #[arg(long, value_enum)]
    pub order: Option<Order>,

    /// Renumber everything, discarding existing numbers
    #[arg(long)]
    pub reset: bool,

    /// Write the annotated snapshot here instead of stdout
    #[arg(short, long, value_name = "PATH", conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Overwrite the input snapshot
    #[arg(short, long)]
    pub in_place: bool,
}

impl AnnotateArgs {
    fn options(&self) -> Result<AnnotateOptions> {
        let mut options = match &self.config {
            Some(path) => AnnotateOptions::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AnnotateOptions::default(),
        };

        if self.per_sheet {
            options.numbering = NumberingScheme::PerSheet;
        }
        if let Some(interval) = self.sheet_interval {
            options.sheet_interval = interval;
        }
        if let Some(start) = self.start {
            options.start_number = start;
        }
        if let Some(order) = self.order {
            options.order = order.into();
        }
        options.reset |= self.reset;

        options.validate()?;
        Ok(options)
    }
}

pub fn execute(args: AnnotateArgs) -> Result<()> {
    let options = args.options()?;
    let mut snapshot = Snapshot::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let (changes, numbered, problems) = {
        let mut list = snapshot.flatten()?;
        let pending: HashSet<_> = list
            .iter()
            .filter(|r| options.reset || !r.is_annotated())
            .map(Reference::key)
            .collect();

        list.annotate_with(&options, &snapshot.lock_groups);
        let problems = list.check_annotation(&mut LogSink);

        list.sort_by_reference_only();
        let numbered = shorthand(
            list.iter().filter(|r| pending.contains(&r.key())),
            list.library(),
        );
        (list.annotation_changes(), numbered, problems)
    };

    let changed = snapshot.apply(&changes);
    if numbered.is_empty() {
        eprintln!("{}", "Nothing to annotate".dimmed());
    } else {
        eprintln!("{} {numbered}", "Annotated".green().bold());
    }
    log::info!("{changed} occurrence(s) updated");
    if problems > 0 {
        eprintln!(
            "{}",
            format!("{problems} annotation problem(s) remain, run `pcb-annotate check`").yellow()
        );
    }

    let json = snapshot.to_json()?;
    let destination = if args.in_place {
        Some(&args.file)
    } else {
        args.output.as_ref()
    };
    match destination {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
