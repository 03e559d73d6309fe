// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wcs: operator CLI for work coordinate system offsets.
//!
//! Loads host preferences, opens the offsets state file, and feeds G-code
//! lines (`G53`, `G54`..`G59`, `G10 L2 P..`, `WORK_OFFSETS`) to the offset
//! controller against a simulated motion layer. Every process starts in
//! machine space; stored offsets persist between runs.

mod config;
mod motion;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use config::HostPrefs;
use motion::SimulatedMotion;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use wcs_core::command::REPORT_COMMAND;
use wcs_core::{Dispatcher, OffsetBackend, OffsetController, OffsetTable};

/// Exit status when at least one command was rejected.
const EXIT_COMMAND_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Machine config file (JSON); the offsets file is kept beside it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the offsets file (overrides the config file location)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute G-code lines in order
    Exec {
        /// Lines such as "G10 L2 P2 X10 Y5" or "G55"
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Execute lines from a file, or stdin when no file is given
    Run {
        /// Script file
        file: Option<PathBuf>,
        /// Stop at the first rejected command
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the stored offsets
    List,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_dispatcher<B>(prefs: &HostPrefs, backend: B) -> Result<Dispatcher<B, SimulatedMotion>>
where
    B: OffsetBackend,
{
    if !prefs.work_offsets.is_enabled() {
        info!("work offsets disabled by host preferences");
        return Ok(Dispatcher::disabled());
    }
    let table = OffsetTable::load(backend).context("loading work offsets")?;
    Ok(Dispatcher::new(OffsetController::new(
        table,
        SimulatedMotion::default(),
    )))
}

/// Feeds `lines` to the dispatcher, writing acknowledgments to `out`.
///
/// Returns the number of rejected lines.
fn run_lines<B, I, W>(
    dispatcher: &mut Dispatcher<B, SimulatedMotion>,
    lines: I,
    fail_fast: bool,
    out: &mut W,
) -> io::Result<usize>
where
    B: OffsetBackend,
    I: IntoIterator<Item = io::Result<String>>,
    W: Write,
{
    let mut failures = 0;
    for line in lines {
        let line = line?;
        match dispatcher.dispatch(&line) {
            Ok(Some(reply)) => writeln!(out, "{reply}")?,
            Ok(None) => {}
            Err(err) => {
                failures += 1;
                writeln!(out, "!! {err}")?;
                if fail_fast {
                    break;
                }
            }
        }
    }
    Ok(failures)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let prefs = HostPrefs::load(args.config.as_deref())?;
    let backend = prefs.backend(args.state_dir.as_deref(), args.config.as_deref())?;
    info!(dir = %backend.base().display(), "offsets state directory");
    let mut dispatcher = build_dispatcher(&prefs, backend)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let failures = match args.cmd {
        Command::Exec { lines } => {
            run_lines(&mut dispatcher, lines.into_iter().map(Ok), false, &mut out)?
        }
        Command::Run { file, fail_fast } => match file {
            Some(path) => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let lines = text.lines().map(|l| Ok(l.to_owned()));
                run_lines(&mut dispatcher, lines, fail_fast, &mut out)?
            }
            None => {
                let stdin = io::stdin();
                run_lines(&mut dispatcher, stdin.lock().lines(), fail_fast, &mut out)?
            }
        },
        Command::List => run_lines(
            &mut dispatcher,
            std::iter::once(Ok(REPORT_COMMAND.to_owned())),
            false,
            &mut out,
        )?,
    };
    out.flush()?;

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_COMMAND_FAILED)
    })
}
