use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use env_logger::Env;
use pcb_refdes::SortOrder;

mod annotate;
mod check;
mod sort;

#[derive(Parser)]
#[command(name = "pcb-annotate")]
#[command(about = "Reference designator annotation for schematic snapshots", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Number unannotated references
    #[command(alias = "a")]
    Annotate(annotate::AnnotateArgs),

    /// Report duplicate, missing and inconsistent designators
    #[command(alias = "c")]
    Check(check::CheckArgs),

    /// List references in a given order
    Sort(sort::SortArgs),
}

/// Command-line spelling of [`SortOrder`].
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Order {
    X,
    Y,
    TimeStamp,
    ReferenceAndValue,
    Reference,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::X => SortOrder::XPosition,
            Order::Y => SortOrder::YPosition,
            Order::TimeStamp => SortOrder::TimeStamp,
            Order::ReferenceAndValue => SortOrder::ReferenceAndValue,
            Order::Reference => SortOrder::ReferenceOnly,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug; RUST_LOG still wins.
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Annotate(args) => annotate::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Sort(args) => sort::execute(args),
    }
}
