use std::path::PathBuf;

use anyhow::{Context, Result};
use biofilter::data::model::TableId;
use biofilter::{Criteria, EngineConfig, Explorer};
use clap::{Parser, Subcommand};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "biofilter", version, about = "Filter and cross-reference UniProt / DrugBank tables")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Protein table, overriding the configuration.
    #[arg(long, global = true)]
    protein: Option<PathBuf>,

    /// Drug table, overriding the configuration.
    #[arg(long, global = true)]
    drug: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the legal filter operands of some columns.
    Domains {
        /// `protein` or `drug`.
        table: TableId,
        /// Columns to describe; all catalogued columns present when omitted.
        fields: Vec<String>,
    },
    /// Filter a table and print the matching rows.
    Filter {
        table: TableId,
        /// JSON file mapping column → criterion.
        #[arg(long)]
        criteria: Option<PathBuf>,
        /// Columns to print for the matching rows.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Resolve protein rows to drug rows.
    Xref {
        /// Protein row; every referencing row when omitted.
        #[arg(long)]
        row: Option<usize>,
        /// Drug columns to print for the resolved rows.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = cli.protein {
        config.tables.protein = path;
    }
    if let Some(path) = cli.drug {
        config.tables.drug = path;
    }

    let explorer = Explorer::load_tables(config).context("loading tables")?;

    let output = match cli.command {
        Command::Domains { table, fields } => {
            let fields = if fields.is_empty() {
                let catalog = explorer.config().catalog(table);
                catalog
                    .fields()
                    .filter(|f| explorer.table(table).has_column(f))
                    .map(str::to_string)
                    .collect()
            } else {
                fields
            };
            serde_json::to_value(explorer.extract_domains(table, &fields)?)?
        }
        Command::Filter {
            table,
            criteria,
            fields,
        } => {
            let criteria: Criteria = match criteria {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading criteria {}", path.display()))?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("parsing criteria {}", path.display()))?
                }
                None => Criteria::new(),
            };
            let rows = explorer.filter(table, &criteria);
            let values = explorer.project(table, &rows, &fields)?;
            json!({ "rows": rows, "values": values })
        }
        Command::Xref { row: Some(row), fields } => {
            let drugs = explorer.resolve_cross_reference(row)?;
            let values = explorer.project(TableId::Drug, &drugs, &fields)?;
            json!({ "protein_row": row, "drug_rows": drugs, "values": values })
        }
        Command::Xref { row: None, .. } => serde_json::to_value(explorer.resolve_all()?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
