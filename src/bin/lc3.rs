use std::io::{stdin, stdout, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueHint};
use tracing::{debug, error};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

use lc3vm::loader::read_image_file;
use lc3vm::memory::Memory;
use lc3vm::registers::PC_START;
use lc3vm::{ChannelConsole, Console, ConsoleError, Emulator, Fault, State, Terminal};

const EXIT_LOAD_FAILED: u8 = 1;
const EXIT_FAULTED: u8 = 3;
const EXIT_CONSOLE_FAILED: u8 = 4;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[clap(version, about = "Runs LC-3 program images")]
struct Opt {
    /// Program images to load, in order. Later images overwrite earlier ones where they overlap.
    #[clap(required = true, value_hint = ValueHint::FilePath)]
    images: Vec<PathBuf>,

    /// Address execution starts at (hex as 0x3000 or x3000, or decimal)
    #[clap(long, value_parser = parse_address, default_value_t = PC_START)]
    start: u16,

    /// Increase the level of verbosity. Can be used multiple times.
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Use JSON output for log messages
    #[clap(long)]
    json: bool,
}

impl Opt {
    const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "lc3vm=info,lc3=info,warn",
            2 => "lc3vm=debug,lc3=debug,info",
            3..=u8::MAX => "lc3vm=trace,lc3=trace,info",
        }
    }

    fn filter_layer(&self) -> EnvFilter {
        // Parse log level from env, or infer it from args
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_filter()))
    }
}

fn parse_address(s: &str) -> Result<u16, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('x'))
        .or_else(|| s.strip_prefix('X'));
    let parsed = match hex {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn load_images(paths: &[PathBuf]) -> anyhow::Result<Memory> {
    let mut memory = Memory::new();
    for path in paths {
        read_image_file(path, &mut memory)
            .with_context(|| format!("failed to load image {}", path.display()))?;
    }
    Ok(memory)
}

/// Runs the machine to completion. The console is dropped before this returns, which puts
/// the terminal back the way it was.
fn execute<C: Console>(memory: Memory, console: C, start: u16) -> Result<Option<Fault>, ConsoleError> {
    let mut emu = Emulator::with_memory(memory, console);
    emu.registers_mut().pc = start;
    let fault = match emu.run()? {
        State::Faulted(fault) => Some(fault.clone()),
        State::Halted | State::Running => None,
    };
    debug!(steps = emu.steps(), "Execution finished");
    Ok(fault)
}

/// Process exit status for the outcome of [`execute`].
fn exit_status(res: &Result<Option<Fault>, ConsoleError>) -> u8 {
    match res {
        Ok(None) => 0,
        Ok(Some(_)) => EXIT_FAULTED,
        Err(ConsoleError::Interrupted) => EXIT_INTERRUPTED,
        Err(_) => EXIT_CONSOLE_FAILED,
    }
}

fn main() -> ExitCode {
    let opt = Opt::parse();

    let registry = tracing_subscriber::Registry::default().with(opt.filter_layer());
    if opt.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }

    let memory = match load_images(&opt.images) {
        Ok(memory) => memory,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_LOAD_FAILED);
        }
    };

    let res = if stdin().is_terminal() {
        Terminal::new(stdout()).and_then(|terminal| execute(memory, terminal, opt.start))
    } else {
        // KBSR polls must not wait on a pipe that has nothing to read yet
        execute(memory, ChannelConsole::spawn(stdin(), stdout().lock()), opt.start)
    };

    match &res {
        Ok(None) => {}
        Ok(Some(fault)) => error!("{fault}"),
        Err(ConsoleError::Interrupted) => println!("\nExit."),
        Err(e) => error!("{e}"),
    }
    ExitCode::from(exit_status(&res))
}
