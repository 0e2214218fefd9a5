use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;
use sdk85_machines::{Mode, Sdk85System, hex_loader};

mod config;
mod debugger;
mod display;
mod emulator;
mod input;

const DEFAULT_MONITOR_HEX: &str = "monitor.hex";

/// SDK-85 single-board trainer emulator.
///
/// Runs a monitor ROM against an emulated 8085, 8155 timer and 8279
/// keyboard/display controller, with the display and keypad rendered in
/// the terminal. Serial mode talks to the monitor over the CPU's SID/SOD
/// lines at 110 baud instead.
#[derive(Parser)]
#[command(name = "sdk85", version)]
struct Args {
    /// Monitor ROM image in Intel HEX format.
    #[arg(value_name = "MONITOR_HEX")]
    monitor: Option<PathBuf>,

    /// Break into the debugger before executing the first instruction.
    #[arg(short = 'd', long)]
    debug: bool,

    /// Serial (teletype) mode instead of display/keyboard mode.
    #[arg(short = 's', long)]
    serial: bool,

    /// Load an additional expansion ROM from a HEX file.
    #[arg(short = 'e', long, value_name = "FILE")]
    expansion: Option<PathBuf>,

    /// Inject keyboard data at startup in display/keyboard mode.
    #[arg(short = 'i', long, value_name = "STRING")]
    inject: Option<String>,

    /// Verify Intel HEX record checksums while loading.
    #[arg(long)]
    strict_hex: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let config = config::Config::load();

    let mode = if args.serial {
        Mode::Serial
    } else {
        Mode::Display
    };
    let mut system = Sdk85System::new(mode);
    system.cpu.set_rim_clears_pending(config.rim_clears_pending);

    let strict_hex = args.strict_hex || config.verify_hex_checksums;
    let monitor = args
        .monitor
        .or(config.monitor_hex)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MONITOR_HEX));

    if let Err(e) = hex_loader::load_hex_file(system.rom_mut(), &monitor, strict_hex) {
        eprintln!("Error loading monitor HEX file {}: {e}", monitor.display());
        return ExitCode::FAILURE;
    }
    info!("monitor image loaded from {}", monitor.display());

    if let Some(expansion) = &args.expansion {
        if let Err(e) = hex_loader::load_hex_file(system.rom_mut(), expansion, strict_hex) {
            eprintln!("Error loading expansion HEX file {}: {e}", expansion.display());
            return ExitCode::FAILURE;
        }
        info!("expansion image loaded from {}", expansion.display());
    }

    system.reset();

    let options = emulator::Options {
        start_in_debugger: args.debug,
        inject: args.inject.unwrap_or_default(),
    };

    match emulator::run(system, options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Terminal error: {e}");
            ExitCode::FAILURE
        }
    }
}
