//! AH Lab CLI — combination search, single-bet settlement and factor listing.
//!
//! Commands:
//! - `search` — rank factor combinations over a CSV or synthetic dataset
//! - `settle` — grade one Asian Handicap bet
//! - `factors` — list the factor library a config resolves to
//! - `synth` — write a seeded synthetic dataset as CSV

use std::path::{Path, PathBuf};

use ahlab_core::domain::{HandicapLine, MatchRecord, Side};
use ahlab_core::factor::{FactorLibrary, FactorRole};
use ahlab_core::settlement::settle;
use ahlab_runner::{
    generate_synthetic, load_csv, run_search, save_csv, save_report, LogFormat, SearchConfig,
    SearchOptions, SearchReport, SyntheticConfig,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "ahlab",
    about = "AH Lab CLI — Asian Handicap factor combination search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every factor combination and print the best ones.
    Search {
        /// CSV dataset to search.
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Search a synthetic dataset of this many matches instead of a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the report here; `.json` for the full report, `.csv` for the ranking.
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: SearchOverrides,
    },
    /// Settle a single bet and print the outcome and profit.
    Settle {
        #[arg(long)]
        home_score: u32,

        #[arg(long)]
        away_score: u32,

        /// Home-perspective line, e.g. `-0.5`, `-0.75` or `0/-0.5`.
        #[arg(long, allow_hyphen_values = true)]
        line: HandicapLine,

        #[arg(long, value_enum)]
        side: SideArg,

        /// Decimal odds.
        #[arg(long)]
        odds: f64,

        #[arg(long, default_value_t = 100.0)]
        stake: f64,
    },
    /// List the factors a search would combine.
    Factors {
        /// Path to a TOML config file. Defaults to the standard library.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the library as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a synthetic dataset in the layout `search --data` reads.
    Synth {
        #[arg(long, default_value_t = 380)]
        matches: usize,

        #[arg(long, default_value_t = 20)]
        teams: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

/// Flags that override the `[search]` and `[logging]` config sections.
#[derive(Args)]
struct SearchOverrides {
    /// Smallest combination size (overrides config).
    #[arg(long)]
    min_size: Option<usize>,

    /// Largest combination size (overrides config).
    #[arg(long)]
    max_size: Option<usize>,

    /// Minimum bet count for a combination to be ranked (overrides config).
    #[arg(long)]
    min_bets: Option<usize>,

    /// Number of entries to keep (overrides config); 0 keeps all.
    #[arg(long, conflicts_with = "all")]
    top: Option<usize>,

    /// Keep every combination that meets --min-bets.
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Score on the calling thread instead of the rayon pool.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Log level filter (overrides both config and RUST_LOG).
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: pretty or json (overrides config).
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl SearchOverrides {
    fn apply(self, cfg: &mut SearchConfig) {
        if let Some(v) = self.min_size {
            cfg.search.min_size = v;
        }
        if let Some(v) = self.max_size {
            cfg.search.max_size = v;
        }
        if let Some(v) = self.min_bets {
            cfg.search.min_bets = v;
        }
        if let Some(n) = self.top {
            cfg.search.top = (n > 0).then_some(n);
        }
        if self.all {
            cfg.search.top = None;
        }
        if self.sequential {
            cfg.search.parallel = false;
        }
        if let Some(level) = self.log_level {
            cfg.logging.level = level;
            cfg.logging.override_env = true;
        }
        if let Some(format) = self.log_format {
            cfg.logging.format = format;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Home,
    Away,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Home => Side::Home,
            SideArg::Away => Side::Away,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            data,
            synthetic,
            seed,
            config,
            output,
            overrides,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            overrides.apply(&mut cfg);
            run_search_cmd(cfg, data, synthetic, seed, output)
        }
        Commands::Settle {
            home_score,
            away_score,
            line,
            side,
            odds,
            stake,
        } => run_settle(home_score, away_score, &line, side.into(), odds, stake),
        Commands::Factors { config, json } => {
            let cfg = load_config(config.as_deref())?;
            run_factors(&cfg.library()?, json)
        }
        Commands::Synth {
            matches,
            teams,
            seed,
            output,
        } => run_synth(matches, teams, seed, &output),
    }
}

fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    match path {
        Some(p) => SearchConfig::load(p)
            .with_context(|| format!("failed to load config: {}", p.display())),
        None => Ok(SearchConfig::default()),
    }
}

fn run_search_cmd(
    cfg: SearchConfig,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    output: Option<PathBuf>,
) -> Result<()> {
    cfg.logging
        .init()
        .context("failed to initialize logging")?;
    cfg.validate()?;
    let library = cfg.library()?;

    let dataset: Vec<MatchRecord> = match (data, synthetic) {
        (Some(path), _) => {
            let loaded = load_csv(&path)?;
            for row in &loaded.rejected_rows {
                warn!(line = row.line, reason = %row.reason, "skipping unreadable row");
            }
            info!(
                path = %path.display(),
                records = loaded.records.len(),
                skipped = loaded.rejected_rows.len(),
                "dataset loaded"
            );
            loaded.records
        }
        (None, Some(matches)) => {
            info!(matches, seed, "generating synthetic dataset");
            generate_synthetic(&SyntheticConfig::new(matches, seed))
        }
        (None, None) => bail!("one of --data or --synthetic is required"),
    };

    let options = SearchOptions::from(&cfg.search);
    let report = run_search(&dataset, &library, &options)?;

    print_report(&report);

    if let Some(path) = output {
        save_report(&report, &path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn run_settle(
    home_score: u32,
    away_score: u32,
    line: &HandicapLine,
    side: Side,
    odds: f64,
    stake: f64,
) -> Result<()> {
    let graded = settle(home_score, away_score, line, side, odds, stake)?;
    println!("Score:   {home_score}-{away_score}");
    println!("Line:    {line} (home)");
    println!("Bet:     {side} @ {odds:.2}, stake {stake:.2}");
    println!("Outcome: {}", graded.outcome.label());
    println!("Profit:  {:+.2}", graded.profit);
    Ok(())
}

fn run_factors(library: &FactorLibrary, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(library.factors())
            .context("failed to serialize factor library")?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "Factors: {} ({} sides, {} stakes, {} filters)",
        library.len(),
        library.sides().len(),
        library.stakes().len(),
        library.filters().len()
    );
    println!();
    println!("{:<5} {:<24} {:<7} Selects", "Id", "Name", "Role");
    println!("{}", "-".repeat(72));
    for (id, factor) in library.iter() {
        let selects = match &factor.role {
            FactorRole::Side { side } => format!("bet {side}"),
            FactorRole::Stake { policy } => policy.label(),
            FactorRole::Filter => serde_json::to_string(&factor.predicate)
                .context("failed to serialize predicate")?,
        };
        println!(
            "{:<5} {:<24} {:<7} {}",
            id.to_string(),
            factor.id,
            factor.kind().to_string(),
            selects
        );
    }
    Ok(())
}

fn run_synth(matches: usize, teams: usize, seed: u64, output: &Path) -> Result<()> {
    let config = SyntheticConfig {
        matches,
        teams,
        seed,
        ..SyntheticConfig::default()
    };
    let records = generate_synthetic(&config);
    save_csv(&records, output)
        .with_context(|| format!("failed to write dataset: {}", output.display()))?;
    println!("Wrote {} matches to {}", records.len(), output.display());
    Ok(())
}

fn print_report(report: &SearchReport) {
    println!();
    println!("=== Search Result ===");
    println!("Dataset:        {}", report.dataset_hash.short());
    println!(
        "Records:        {} ({} valid, {} rejected)",
        report.total_records,
        report.valid_records,
        report.rejected_records()
    );
    println!("Factors:        {}", report.factor_count);
    println!(
        "Sizes:          {}..={}",
        report.options.min_size, report.options.max_size
    );
    for s in &report.sizes {
        println!(
            "  size {}: {} combinations, {} qualified",
            s.size, s.combinations, s.qualified
        );
    }
    println!("Scored:         {}", report.total_scored());
    println!("Elapsed:        {} ms", report.elapsed_ms);
    println!();

    if report.entries.is_empty() {
        println!(
            "No combination reached {} bets.",
            report.options.min_bets
        );
        return;
    }

    println!(
        "{:>4} {:>8} {:>6} {:>8} {:>10} {:>7} {:>6}  Combination",
        "Rank", "ROI", "Bets", "WinRate", "Profit", "Stake", "Odds"
    );
    println!("{}", "-".repeat(96));
    for e in &report.entries {
        let r = &e.result;
        println!(
            "{:>4} {:>7.2}% {:>6} {:>7.1}% {:>10.2} {:>7.0} {:>6.2}  {}",
            e.rank,
            r.roi * 100.0,
            r.bet_count,
            r.win_rate * 100.0,
            r.total_profit,
            r.total_stake,
            r.average_odds,
            e.description
        );
    }
    println!();
}
