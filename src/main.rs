use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use gridly::boundary::EdgePolicy;
use gridly::delta::{NullLog, RecordingLog};
use gridly::engine::{Engine, Mode, StepOutcome};
use gridly::error::Error;
use gridly::grid::Grid;
use gridly::io::{DebugIo, StandardIo};
use gridly::opcode::is_instruction;
use gridly::run::{RunConfig, exit_code, run};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridly", about = "Run a gridly program")]
struct Cli {
    /// Program file: a grid of characters, one row per line.
    file: PathBuf,

    /// Step through the program interactively. Enter steps, `b` steps back,
    /// `q` quits.
    #[arg(long)]
    debug: bool,

    /// Number of steps the debugger can undo.
    #[arg(long, default_value_t = 1000)]
    history: usize,

    /// Random seed for `?` (defaults to system entropy).
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many steps.
    #[arg(long)]
    step_limit: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let grid = match Grid::load(&cli.file) {
        Ok(grid) => grid,
        Err(e @ Error::FileNotFound(_)) => {
            println!("{}", capitalize(&e.to_string()));
            std::process::exit(2);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let result = if cli.debug {
        run_debug(grid, rng, &cli)
    } else {
        run_plain(grid, rng, &cli)
    };
    match result {
        Ok(code) => {
            println!();
            std::process::exit(code);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn run_plain(grid: Grid, rng: SmallRng, cli: &Cli) -> gridly::Result<i32> {
    let mut engine = Engine::new(grid, StandardIo::stdio(), EdgePolicy::default(), NullLog, rng);
    let config = RunConfig {
        step_limit: cli.step_limit,
    };
    let summary = run(&mut engine, &config)?;
    Ok(summary.exit_code)
}

fn run_debug(grid: Grid, rng: SmallRng, cli: &Cli) -> gridly::Result<i32> {
    let io = DebugIo::new(io::stdin().lock(), io::stdout());
    let mut engine = Engine::new(
        grid,
        io,
        EdgePolicy::default(),
        RecordingLog::bounded(cli.history),
        rng,
    );
    let mut steps = 0usize;

    while engine.running() && cli.step_limit.is_none_or(|limit| steps < limit) {
        show(&engine)?;
        print!("...");
        io::stdout().flush()?;
        let command = engine.io_mut().read_line()?;
        match command.as_deref().map(str::trim) {
            None | Some("q") => break,
            Some("b") => {
                if engine.unstep()? {
                    steps = steps.saturating_sub(1);
                } else {
                    println!("(no history)");
                }
            }
            Some(_) => match engine.step()? {
                StepOutcome::Executed => steps += 1,
                StepOutcome::Halted | StepOutcome::Stalled => break,
            },
        }
        println!();
    }
    Ok(exit_code(engine.stack()))
}

fn show<R: BufRead, W: Write>(
    engine: &Engine<DebugIo<R, W>, EdgePolicy, RecordingLog, SmallRng>,
) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in engine.io().tail(3) {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "V: {}", engine.velocity())?;
    writeln!(out, "S: {}", engine.stack())?;
    writeln!(out, "Mode: {}", engine.mode())?;
    writeln!(out, "OPCode: {}", opcode_label(engine.operator(), engine.mode()))?;
    writeln!(out, "History: {}", history_label(engine.history_depth(), engine.log().limit()))?;
    writeln!(out, "{}", engine.grid().render_with_marker(engine.position(), '☺'))?;
    Ok(())
}

fn opcode_label(cell: Option<char>, mode: Mode) -> String {
    match cell {
        None => "(none)".to_string(),
        Some(c) if mode == Mode::Normal && !is_instruction(c) => format!("{c} (no-op)"),
        Some(c) => c.to_string(),
    }
}

fn history_label(depth: usize, limit: Option<usize>) -> String {
    match limit {
        Some(limit) => format!("{depth}/{limit}"),
        None => depth.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_label_marks_no_ops() {
        assert_eq!(opcode_label(Some('+'), Mode::Normal), "+");
        assert_eq!(opcode_label(Some('x'), Mode::Normal), "x (no-op)");
        assert_eq!(opcode_label(Some('x'), Mode::Text), "x");
        assert_eq!(opcode_label(None, Mode::Normal), "(none)");
    }

    #[test]
    fn history_label_shows_capacity() {
        assert_eq!(history_label(3, Some(1000)), "3/1000");
        assert_eq!(history_label(3, None), "3");
    }
}
