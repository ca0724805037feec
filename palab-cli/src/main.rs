//! PA Lab CLI — one command per pipeline stage.
//!
//! Commands:
//! - `mtf` — fetch H1/H4/D/W candles and build the merged EMA dataset
//! - `annotate` — classify every H1 bar
//! - `signals` — run the regime/bar/trigger funnel
//! - `backtest` — close-only backtest of the entry signals
//! - `sweep` — rank a look-back × R-multiple grid
//! - `snapshot` — QA and feature statistics of the annotated dataset

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use palab_core::backtest::{BacktestMetrics, BacktestParams};
use palab_core::classify::ClassifierParams;
use palab_core::domain::{ms_to_iso, RegimeMode};
use palab_runner::{
    binance_provider, init_logging, load_classifier_params, run_annotate, run_backtest_stage,
    run_mtf, run_signals, run_snapshot, run_sweep, Dataset, ParamGrid, Settings,
};

#[derive(Parser)]
#[command(name = "palab", about = "PA Lab — price-action pattern lab for crypto candles")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles and build the merged multi-timeframe dataset.
    Mtf {
        /// Symbol (e.g. BTCUSDT). Defaults to DEFAULT_SYMBOL.
        symbol: Option<String>,

        /// Number of H1 candles to fetch.
        #[arg(long, default_value_t = 300)]
        limit: usize,
    },
    /// Classify every H1 bar of the merged dataset.
    Annotate {
        symbol: Option<String>,

        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,

        /// TOML file overriding classifier thresholds.
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Evaluate the entry funnel over the annotated dataset.
    Signals {
        symbol: Option<String>,

        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,

        /// Regime filter: D_ONLY, D_AND_W, H4_AND_D or NONE.
        #[arg(long, default_value = "D_ONLY")]
        regime: String,

        /// Print the last entries.
        #[arg(long, default_value_t = false)]
        debug: bool,
    },
    /// Backtest the entry signals on H1 closes.
    Backtest {
        symbol: Option<String>,

        #[arg(long)]
        signals: Option<PathBuf>,

        #[arg(long)]
        annotated: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,

        /// Closes before the entry that define the stop.
        #[arg(long, default_value_t = 5)]
        lookback: usize,

        /// Target distance in R.
        #[arg(long, default_value_t = 1.0)]
        r_mult: f64,
    },
    /// Backtest a grid of look-backs and R multiples.
    Sweep {
        symbol: Option<String>,

        #[arg(long)]
        signals: Option<PathBuf>,

        #[arg(long)]
        annotated: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,

        /// Comma-separated look-backs (default 3,5,8,10,13).
        #[arg(long, value_delimiter = ',')]
        lookbacks: Vec<usize>,

        /// Comma-separated R multiples (default 0.7,1.0,1.5,2.0).
        #[arg(long, value_delimiter = ',')]
        r_mults: Vec<f64>,
    },
    /// Write a QA snapshot of the annotated dataset.
    Snapshot {
        symbol: Option<String>,

        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = Settings::from_env();
    tracing::debug!(
        output_dir = %settings.output_dir.display(),
        default_symbol = %settings.default_symbol,
        fees_bps = settings.fees_bps,
        "settings loaded"
    );

    match cli.command {
        Commands::Mtf { symbol, limit } => run_mtf_cmd(&settings, symbol.as_deref(), limit),
        Commands::Annotate {
            symbol,
            input,
            output,
            params,
        } => run_annotate_cmd(&settings, symbol.as_deref(), input, output, params),
        Commands::Signals {
            symbol,
            input,
            output,
            regime,
            debug,
        } => run_signals_cmd(&settings, symbol.as_deref(), input, output, &regime, debug),
        Commands::Backtest {
            symbol,
            signals,
            annotated,
            output,
            lookback,
            r_mult,
        } => {
            let paths = StagePaths::resolve(
                &settings,
                symbol.as_deref(),
                signals,
                annotated,
                output,
                Dataset::Trades,
            );
            let params = BacktestParams::new(lookback, r_mult, settings.cost_model());
            run_backtest_cmd(&paths, &params)
        }
        Commands::Sweep {
            symbol,
            signals,
            annotated,
            output,
            lookbacks,
            r_mults,
        } => {
            let paths = StagePaths::resolve(
                &settings,
                symbol.as_deref(),
                signals,
                annotated,
                output,
                Dataset::Sweep,
            );
            let mut grid = ParamGrid::default();
            if !lookbacks.is_empty() {
                grid.lookbacks = lookbacks;
            }
            if !r_mults.is_empty() {
                grid.r_mults = r_mults;
            }
            run_sweep_cmd(&settings, &paths, &grid)
        }
        Commands::Snapshot {
            symbol,
            input,
            output,
        } => {
            let symbol = settings.symbol_or_default(symbol.as_deref());
            let input = input.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Annotated));
            let output = output.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Snapshot));
            let snap = run_snapshot(&symbol, &input, &output)?;
            println!("OK snapshot -> {}", output.display());
            println!(
                "Rows: {}   Range: {} -> {}",
                snap.qa.rows, snap.qa.date_range.start, snap.qa.date_range.end
            );
            if !snap.counts.bar_type.is_empty() {
                println!("bar_type: {:?}", snap.counts.bar_type);
            }
            if !snap.counts.bo_dir.is_empty() {
                println!("bo_dir: {:?}", snap.counts.bo_dir);
            }
            let p = &snap.percentages;
            println!("tight_range %: {}", fmt_opt(p.tight_range_pct));
            println!(
                "rev_bull %: {}  | rev_bear %: {}",
                fmt_opt(p.reversal_bar_bull_pct),
                fmt_opt(p.reversal_bar_bear_pct)
            );
            Ok(())
        }
    }
}

/// Input and output datasets of the backtest and sweep commands.
struct StagePaths {
    signals: PathBuf,
    annotated: PathBuf,
    output: PathBuf,
}

impl StagePaths {
    fn resolve(
        settings: &Settings,
        symbol: Option<&str>,
        signals: Option<PathBuf>,
        annotated: Option<PathBuf>,
        output: Option<PathBuf>,
        output_dataset: Dataset,
    ) -> Self {
        let symbol = settings.symbol_or_default(symbol);
        Self {
            signals: signals.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Signals)),
            annotated: annotated
                .unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Annotated)),
            output: output.unwrap_or_else(|| settings.dataset_path(&symbol, output_dataset)),
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}"))
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn run_mtf_cmd(settings: &Settings, symbol: Option<&str>, limit: usize) -> Result<()> {
    let symbol = settings.symbol_or_default(symbol);
    let provider = binance_provider(settings)?;
    let outcome = run_mtf(&provider, settings, &symbol, limit)?;

    for (tf, count) in &outcome.candle_counts {
        println!("{tf}: {count} candles");
    }
    println!("OK mtf -> {} ({} rows)", outcome.output.display(), outcome.rows.len());
    for row in outcome.tail(3) {
        println!(
            "{}  close={:.2}  h4={}  d={}  w={}  h1_ema20={}  d_ema50={}",
            ms_to_iso(row.t_close),
            row.close,
            fmt_value(row.h4_close),
            fmt_value(row.d_close),
            fmt_value(row.w_close),
            fmt_value(row.emas.h1.ema20),
            fmt_value(row.emas.d.ema50),
        );
    }
    Ok(())
}

fn run_annotate_cmd(
    settings: &Settings,
    symbol: Option<&str>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    params_path: Option<PathBuf>,
) -> Result<()> {
    let symbol = settings.symbol_or_default(symbol);
    let input = input.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Mtf));
    let output = output.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Annotated));
    let params = match params_path {
        Some(path) => load_classifier_params(&path)?,
        None => ClassifierParams::default(),
    };

    let s = run_annotate(&input, &output, &params)?;
    println!("OK annotate -> {} ({} rows)", output.display(), s.rows);
    println!(
        "bar_type: trend_bull={} trend_bear={} doji={}",
        s.trend_bull, s.trend_bear, s.doji
    );
    println!(
        "tight={} bo_up={} bo_down={} rev_bull={} rev_bear={} gap20={}",
        s.tight_range, s.bo_up, s.bo_down, s.reversal_bull, s.reversal_bear, s.gap_context
    );
    Ok(())
}

fn run_signals_cmd(
    settings: &Settings,
    symbol: Option<&str>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    regime: &str,
    debug: bool,
) -> Result<()> {
    let regime: RegimeMode = regime.parse()?;
    let symbol = settings.symbol_or_default(symbol);
    let input = input.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Annotated));
    let output = output.unwrap_or_else(|| settings.dataset_path(&symbol, Dataset::Signals));

    let summary = run_signals(&input, &output, regime)?;
    let f = summary.funnel;
    println!("OK signals -> {} (regime {})", output.display(), regime.as_str());
    println!(
        "[FUNNEL] regime:{} bar:{} tight:{} trig:{} entries:{}",
        f.regime, f.bar, f.tight, f.trig, f.entries
    );
    if debug {
        for s in &summary.last_entries {
            println!("  entry {}  close={:.2}  {}", ms_to_iso(s.t_close), s.close, s.rule_id);
        }
    }
    Ok(())
}

fn print_metrics(m: &BacktestMetrics) {
    println!(
        "Trades: {}  wins: {}  losses: {}  eod: {}",
        m.trades, m.wins, m.losses, m.eod
    );
    println!(
        "Win rate: {:.2}%  AvgR: {:.3}  ExpectancyR: {:.3}",
        m.win_rate * 100.0,
        m.avg_r,
        m.expectancy_r
    );
    if m.rejected.total() > 0 {
        println!(
            "Rejected: {} (unknown t: {}, short history: {}, R<=0: {})",
            m.rejected.total(),
            m.rejected.unknown_timestamp,
            m.rejected.insufficient_history,
            m.rejected.non_positive_risk
        );
    }
}

fn run_backtest_cmd(paths: &StagePaths, params: &BacktestParams) -> Result<()> {
    let report = run_backtest_stage(&paths.signals, &paths.annotated, &paths.output, params)?;
    println!(
        "OK backtest -> {} (N={}, R={})",
        paths.output.display(),
        params.lookback,
        params.r_mult
    );
    print_metrics(&report.metrics);
    Ok(())
}

fn run_sweep_cmd(settings: &Settings, paths: &StagePaths, grid: &ParamGrid) -> Result<()> {
    let rows = run_sweep(
        &paths.signals,
        &paths.annotated,
        &paths.output,
        grid,
        settings.cost_model(),
    )?;
    println!("OK sweep -> {}", paths.output.display());
    println!(
        "{:>4} {:>5} {:>7} {:>8} {:>8} {:>8}",
        "N", "R", "trades", "winrate", "AvgR", "ExpectR"
    );
    for row in &rows {
        let m = &row.metrics;
        println!(
            "{:>4} {:>5.1} {:>7} {:>7.1}% {:>8.3} {:>8.3}",
            row.params.lookback,
            row.params.r_mult,
            m.trades,
            m.win_rate * 100.0,
            m.avg_r,
            m.expectancy_r
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sweep_lists_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "palab",
            "sweep",
            "BTCUSDT",
            "--lookbacks",
            "3,8",
            "--r-mults",
            "1.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Sweep {
                lookbacks, r_mults, ..
            } => {
                assert_eq!(lookbacks, vec![3, 8]);
                assert_eq!(r_mults, vec![1.5]);
            }
            _ => panic!("expected sweep"),
        }
    }

    #[test]
    fn backtest_defaults() {
        let cli = Cli::try_parse_from(["palab", "backtest"]).unwrap();
        match cli.command {
            Commands::Backtest {
                symbol,
                lookback,
                r_mult,
                ..
            } => {
                assert_eq!(symbol, None);
                assert_eq!(lookback, 5);
                assert_eq!(r_mult, 1.0);
            }
            _ => panic!("expected backtest"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli =
            Cli::try_parse_from(["palab", "signals", "ETHUSDT", "--regime", "none", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
