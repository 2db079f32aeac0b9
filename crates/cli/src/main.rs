use clap::Parser;
use firstlight_core::sim::SimBoard;
use firstlight_core::{
    BringupConfig, BringupObserver, BringupSequencer, BringupState, DebugStub, InitStep,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const EXIT_CONFIG_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "FirstLight bring-up sequencer", long_about = None)]
struct Args {
    /// Path to a board profile (YAML)
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Number of consecutive resets to run (watchdog restart simulation)
    #[arg(long, default_value = "1")]
    resets: u32,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable step-level execution tracing
    #[arg(short, long)]
    trace: bool,

    /// TCP port for the GDB stub
    #[cfg(feature = "debug-stub")]
    #[arg(long, default_value = "3333")]
    debug_port: u16,
}

#[derive(Debug)]
struct StepLogger;

impl BringupObserver for StepLogger {
    fn on_step_complete(&self, step: &InitStep) {
        info!(step = step.name, "step complete");
    }
}

fn run_resets<D: DebugStub>(
    board: &SimBoard,
    config: BringupConfig,
    resets: u32,
    mut make_stub: impl FnMut() -> D,
) -> anyhow::Result<BringupState> {
    let mut last_state = BringupState::NotStarted;
    for reset in 0..resets {
        let mut seq = BringupSequencer::new(config, board.uart(), make_stub(), board.console());
        seq.add_observer(Arc::new(StepLogger));
        let report = seq.run()?;
        info!(reset, state = ?report.state, "bring-up finished");
        last_state = report.state;
        // The UART handle now belongs to the application side; the next
        // reset starts from scratch.
        drop(report.uart);
    }
    Ok(last_state)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if args.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    info!("Starting FirstLight bring-up");

    if args.resets == 0 {
        tracing::error!("--resets must be at least 1");
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    let profile = match &args.board {
        Some(path) => {
            info!("Loading board profile: {:?}", path);
            match firstlight_config::BoardProfile::from_file(path) {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::error!("Invalid board profile: {:#}", e);
                    std::process::exit(EXIT_CONFIG_ERROR);
                }
            }
        }
        None => {
            info!("Using default board profile");
            firstlight_config::BoardProfile::default()
        }
    };
    info!(board = %profile.board, ports = profile.ports, "board ready");

    let config = BringupConfig {
        rx_baud: profile.uart.rx_baud,
        tx_baud: profile.uart.tx_baud,
        print_port: profile.print_port,
    };
    let board = SimBoard::new(profile.ports);

    #[cfg(feature = "debug-stub")]
    let final_state = run_resets(&board, config, args.resets, || {
        firstlight_gdbstub::GdbDebugStub::new(args.debug_port)
    })?;

    #[cfg(not(feature = "debug-stub"))]
    let final_state = run_resets(&board, config, args.resets, || {
        firstlight_core::NullDebugStub
    })?;

    if let Some(report_path) = &args.report {
        let report = serde_json::json!({
            "board": profile.board,
            "resets": args.resets,
            "final_state": final_state,
            "transcript": board.transcript(),
        });
        std::fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
        info!("Run report written to {:?}", report_path);
    }

    Ok(())
}
