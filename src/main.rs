// lolvm: run or inspect an op trace on the LOLCODE target machine

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use lolvm::interpreter::constants::{DEFAULT_HEAP_SIZE, DEFAULT_HOOK_COUNT, DEFAULT_STACK_CAPACITY};
use lolvm::interpreter::engine::{Machine, MachineConfig};
use lolvm::interpreter::errors::{fail_fast, EXIT_USAGE};
use lolvm::interpreter::trace::Trace;
use lolvm::snapshot::{Replay, DEFAULT_SNAPSHOT_LIMIT};
use lolvm::ui::App;

#[derive(Parser, Debug)]
#[command(name = "lolvm")]
#[command(about = "Run an op trace on the LOLCODE target machine, or step through it in a memory inspector")]
struct Args {
    /// Path to the op trace
    trace: PathBuf,

    /// Operand stack capacity in slots
    #[arg(long, default_value_t = DEFAULT_STACK_CAPACITY)]
    stack_size: usize,

    /// Heap size in bytes
    #[arg(long, default_value_t = DEFAULT_HEAP_SIZE)]
    heap_size: usize,

    /// Number of hook registers
    #[arg(long, default_value_t = DEFAULT_HOOK_COUNT)]
    hooks: usize,

    /// Record every step and open the memory inspector
    #[arg(long)]
    inspect: bool,

    /// Memory budget for recorded history in bytes
    #[arg(long, default_value_t = DEFAULT_SNAPSHOT_LIMIT)]
    snapshot_limit: usize,
}

fn main() {
    let args = Args::parse();

    // The inspector owns the terminal; logging would tear the screen
    if !args.inspect {
        lolvm::init_logging();
    }

    let source = match fs::read_to_string(&args.trace) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", args.trace.display(), e);
            process::exit(EXIT_USAGE);
        }
    };

    let trace = match Trace::parse(&source) {
        Ok(trace) => trace,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {}", e);
            process::exit(EXIT_USAGE);
        }
    };

    let machine = Machine::with_config(MachineConfig {
        stack_capacity: args.stack_size,
        heap_size: args.heap_size,
        hook_count: args.hooks,
    });

    if !args.inspect {
        info!(ops = trace.len(), "running {}", args.trace.display());
        let code = fail_fast(trace.run(machine));
        process::exit(code);
    }

    let replay = Replay::record(trace, machine, args.snapshot_limit);
    if let Err(e) = inspect(replay, source) {
        eprintln!("Error: {:?}", e);
        process::exit(EXIT_USAGE);
    }
}

/// Run the inspector, restoring the terminal on every exit path
fn inspect(replay: Replay, source: String) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(replay, source);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}
