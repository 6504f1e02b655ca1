use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use pcb_refdes::{ReferenceList, Snapshot};

use crate::Order;

#[derive(Args, Debug, Clone)]
#[command(about = "List the references of a schematic snapshot in a given order")]
pub struct SortArgs {
    /// Snapshot JSON file
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Sort order
    #[arg(long, value_enum, default_value = "reference")]
    pub order: Order,

    /// Print a compact designator list (`R1, R4-R7`) instead of a table
    #[arg(short, long)]
    pub shorthand: bool,
}

pub fn execute(args: SortArgs) -> Result<()> {
    let snapshot = Snapshot::load(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let mut list = snapshot.flatten()?;
    list.sort_by(args.order.into());

    let mut writer = io::stdout().lock();
    if args.shorthand {
        writeln!(writer, "{}", list.shorthand())?;
    } else {
        write_reference_table(&list, &mut writer)?;
    }
    Ok(())
}

fn write_reference_table<W: Write>(list: &ReferenceList<'_>, mut writer: W) -> io::Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);

    for r in list {
        let part = list.part_of(r);
        table.add_row(vec![
            r.full_designator(part),
            r.value.to_string(),
            part.name.clone(),
            r.sheet_path.to_string(),
            r.sheet_number.to_string(),
            r.position.to_string(),
        ]);
    }

    table.set_header(vec!["Reference", "Value", "Part", "Sheet", "#", "Position"]);

    writeln!(writer, "{table}")?;
    Ok(())
}
