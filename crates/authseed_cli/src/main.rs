//! Seeding command for the auth store.
//!
//! Opens (and migrates) a SQLite auth store, then applies the seed documents
//! of one feature. Exits non-zero with the wrapped error on failure; phases
//! committed before the failure stay committed unless `--run-mode atomic`.
//! SIGINT or SIGTERM cancels the run at the next store call.

use authseed_core::db::open_db;
use authseed_core::{
    default_log_level, init_logging, seed_database, CancelFlag, Phase, RunMode, SeedConfig,
    SeedReport,
};
use clap::Parser;
use log::{error, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Seed an auth store from declarative seed documents
#[derive(Parser, Debug)]
#[command(name = "authseed")]
#[command(version, about = "Seed an auth store from declarative seed documents")]
struct Args {
    /// SQLite database file; created and migrated when missing
    #[arg(long)]
    db: PathBuf,

    /// Storage engine; selects seed/<engine>/ in the asset tree
    #[arg(long, default_value = authseed_core::config::DEFAULT_ENGINE)]
    engine: String,

    /// Seed feature to apply
    #[arg(long, default_value = authseed_core::config::DEFAULT_FEATURE)]
    feature: String,

    /// Asset directory to read instead of the bundled seed pack
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// per_phase (default) or atomic
    #[arg(long, default_value_t = RunMode::PerPhase)]
    run_mode: RunMode,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; logs go to stderr when unset
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, args.log_dir.as_deref()) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<SeedReport, Box<dyn std::error::Error>> {
    let config = SeedConfig {
        engine: args.engine,
        feature: args.feature,
        run_mode: args.run_mode,
        assets_dir: args.assets_dir,
    };
    config.validate()?;

    let cancel = interrupt_flag()?;
    let mut conn = open_db(&args.db)?;
    let report = seed_database(&mut conn, &config, cancel)?;
    Ok(report)
}

/// Cancel flag raised by SIGINT or SIGTERM instead of killing the process.
fn interrupt_flag() -> std::io::Result<CancelFlag> {
    let interrupted = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&interrupted)).map_err(|err| {
            warn!("event=cli_signal module=cli status=error signal={signal} error={err}");
            err
        })?;
    }
    Ok(CancelFlag::from(interrupted))
}

fn print_report(report: &SeedReport) {
    for document in &report.documents {
        println!("applied {}", document.path);
    }
    for phase in Phase::plan() {
        println!("  {:<28} {}", phase.name(), report.items(phase));
    }
    println!("total items: {}", report.total_items());
}

#[cfg(test)]
mod tests {
    use super::{interrupt_flag, Args};
    use authseed_core::RunMode;
    use clap::{CommandFactory, Parser};

    #[test]
    fn args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn run_mode_flag_accepts_atomic() {
        let args = Args::parse_from(["authseed", "--db", "auth.db", "--run-mode", "atomic"]);
        assert_eq!(args.run_mode, RunMode::Atomic);
        assert_eq!(args.feature, "auth");
    }

    #[test]
    fn interrupt_flag_starts_clear() {
        assert!(!interrupt_flag().unwrap().is_cancelled());
    }
}
