mod config;
mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, save_config};
use crate::display::{
    display_bets, display_draws, display_import_summary, display_latest, display_stats,
};
use crate::import::{SchemaVersion, import_csv};
use lotofacil_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, latest_contest, migrate, open_db};
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::{BetConfig, SamplingPolicy, StatsConfig, generate_bets, get_statistics};

const EMPTY_DB_HINT: &str = "Empty database. Run first: lotofacil import --file <csv>";

#[derive(Parser)]
#[command(name = "lotofacil", about = "Lotofácil draw statistics and bet generator")]
struct Cli {
    /// SQLite database (default: ./data/lotofacil.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON file with engine settings; flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for the lotofacil crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import draws from a CSV file
    Import {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Column layout of the file
        #[arg(short, long, value_enum, default_value_t = SchemaVersion::Caixa)]
        schema: SchemaVersion,

        /// Field delimiter (default: ';' for caixa, ',' for compact)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Print the database path
    DbPath,

    /// List the most recent draws
    List {
        /// Number of draws to show
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Show the latest draw with its prize tiers
    Latest,

    /// Frequency, overdue, sum, parity and final-digit statistics
    Stats {
        /// Draws counted for the hot/cold lists
        #[arg(long)]
        hot_cold_window: Option<usize>,

        /// Draws scanned for overdue numbers
        #[arg(long)]
        overdue_window: Option<usize>,

        /// Length of the hot and cold lists
        #[arg(long)]
        ranking_size: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate bets around the most frequent numbers
    Generate {
        /// Draws counted when picking anchors
        #[arg(long)]
        anchor_window: Option<usize>,

        /// Number of anchors
        #[arg(short, long)]
        anchor_count: Option<usize>,

        /// Total number of bets
        #[arg(short, long)]
        bets: Option<usize>,

        /// Bets built on the anchors (the rest are fully random)
        #[arg(long)]
        anchored: Option<usize>,

        /// Only accept bets with 7 or 8 even numbers
        #[arg(long)]
        parity: bool,

        /// Complete bets with frequency-weighted sampling
        #[arg(long)]
        weighted: bool,

        /// Minimum history required
        #[arg(long)]
        min_history: Option<usize>,

        /// Sampling attempts per bet before giving up
        #[arg(long)]
        max_attempts: Option<usize>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print the bets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the effective engine settings to a JSON file
    InitConfig {
        #[arg(short, long, default_value = "lotofacil.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine_config = load_config(cli.config.as_deref())?;
    let path = cli.db.clone().unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;
    debug!(db = %path.display(), "database ready");

    let stats = engine_config.stats.clone();
    let bets = engine_config.bets.clone();

    match cli.command {
        Command::Import { file, schema, delimiter } => cmd_import(&conn, &file, schema, delimiter),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Latest => cmd_latest(&conn),
        Command::Stats { hot_cold_window, overdue_window, ranking_size, json } => {
            let config = StatsConfig {
                hot_cold_window: hot_cold_window.unwrap_or(stats.hot_cold_window),
                overdue_window: overdue_window.unwrap_or(stats.overdue_window),
                ranking_size: ranking_size.unwrap_or(stats.ranking_size),
            };
            cmd_stats(&conn, &config, json)
        }
        Command::Generate {
            anchor_window,
            anchor_count,
            bets: total_bets,
            anchored,
            parity,
            weighted,
            min_history,
            max_attempts,
            seed,
            json,
        } => {
            let config = BetConfig {
                anchor_window: anchor_window.unwrap_or(bets.anchor_window),
                anchor_count: anchor_count.unwrap_or(bets.anchor_count),
                total_bets: total_bets.unwrap_or(bets.total_bets),
                anchored_bets: anchored.unwrap_or(bets.anchored_bets),
                enforce_parity: parity || bets.enforce_parity,
                min_history: min_history.unwrap_or(bets.min_history),
                max_attempts: max_attempts.unwrap_or(bets.max_attempts),
                sampling: if weighted { SamplingPolicy::FrequencyWeighted } else { bets.sampling },
                seed: seed.or(bets.seed),
            };
            cmd_generate(&conn, &config, json)
        }
        Command::InitConfig { output } => {
            save_config(&engine_config, &output)?;
            println!("Settings written to {}", output.display());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,lotofacil_cli=debug,lotofacil_engine=debug,lotofacil_db=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_import(conn: &Connection, file: &Path, schema: SchemaVersion, delimiter: Option<char>) -> Result<()> {
    let delimiter = delimiter
        .map(|c| u8::try_from(c).context("delimiter must be a single ASCII character"))
        .transpose()?;
    let result = import_csv(conn, file, schema, delimiter)?;
    display_import_summary(&result);
    if let Some(latest) = latest_contest(conn)? {
        println!("  Latest contest     : {}", latest);
    }
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("{EMPTY_DB_HINT}");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_latest(conn: &Connection) -> Result<()> {
    match fetch_last_draws(conn, 1)?.first() {
        Some(draw) => display_latest(draw),
        None => println!("{EMPTY_DB_HINT}"),
    }
    Ok(())
}

fn cmd_stats(conn: &Connection, config: &StatsConfig, json: bool) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("{EMPTY_DB_HINT}");
        return Ok(());
    }
    let history = fetch_history(conn)?;
    let report = get_statistics(&history, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_stats(&report);
    }
    Ok(())
}

fn cmd_generate(conn: &Connection, config: &BetConfig, json: bool) -> Result<()> {
    let history = fetch_history(conn)?;
    let slate = generate_bets(&history, config)
        .with_context(|| format!("cannot generate bets from {} draws", history.len()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&slate)?);
    } else {
        display_bets(&slate);
    }
    Ok(())
}
