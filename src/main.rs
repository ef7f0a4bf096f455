use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use astrodb_ingest::config::Config;
use astrodb_ingest::ingest::{ingest_catalog, CatalogKind};
use astrodb_ingest::loader::load_file;
use astrodb_ingest::spectral_type::{convert_spt_code_to_string, convert_spt_string_to_code};
use astrodb_ingest::verify::{run_checks, CheckSuite};

#[derive(Parser)]
#[command(name = "astrodb-ingest", version, about = "Ingest and verify brown dwarf catalog data")]
struct Cli {
    /// Settings file
    #[arg(short, long, default_value = "astrodb.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a spectral type string to its numeric code, or a code to a string
    Convert {
        value: String,
        /// Decimal places when rendering a code
        #[arg(short, long, default_value_t = 1)]
        decimals: usize,
    },
    /// Ingest a catalog file (.csv, .json, .parquet) into one table
    Ingest {
        #[arg(value_enum)]
        kind: CatalogKind,
        file: PathBuf,
    },
    /// Run a suite of row-count checks against the database
    Verify { checks: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Convert { value, decimals } => {
            let out = match value.trim().parse::<f64>() {
                Ok(code) => convert_spt_code_to_string(code, decimals)?,
                Err(_) => convert_spt_string_to_code(&value)?.to_string(),
            };
            println!("{out}");
        }
        Command::Ingest { kind, file } => {
            let config = Config::load(&cli.config)?;
            let mut db = config.open_database()?;
            let table = load_file(&file)?;

            let report = ingest_catalog(&mut db, kind, &table, config.on_error)
                .with_context(|| format!("ingesting {} from {}", kind, file.display()))?;
            for e in &report.row_errors {
                println!(
                    "row {}: {} ({})",
                    e.line,
                    e.message,
                    e.source.as_deref().unwrap_or("no source")
                );
            }
            println!(
                "{} of {} rows added to {kind}",
                report.rows_added, report.rows_read
            );

            if config.save_db {
                db.save(&config.database)?;
            } else {
                info!("save_db is off, changes were not written");
            }
        }
        Command::Verify { checks } => {
            let config = Config::load(&cli.config)?;
            let db = config.open_database()?;
            let suite = CheckSuite::from_path(&checks)?;

            let outcomes = run_checks(&db, &suite);
            let failed = outcomes.iter().filter(|o| !o.passed).count();
            for o in &outcomes {
                let status = if o.passed { "ok" } else { "FAILED" };
                println!("{status:>6}  {}: {}", o.name, o.message);
            }
            if failed > 0 {
                bail!("{failed} of {} checks failed", outcomes.len());
            }
            println!("all {} checks passed", outcomes.len());
        }
    }

    Ok(())
}
