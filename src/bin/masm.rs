//! The interpreter front end. Takes a MASM binary image, optional program
//! arguments, and the debug/trace flags.
//!
//! Run with `--help` for more info.

use masm_vm::prelude::*;

use clap::Parser;

use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(version, about = "Run a MASM binary image", long_about = None)]
struct Args {
    /// the image to execute
    image: PathBuf,
    /// arguments passed through to the program (ARGC/GETARG)
    args: Vec<String>,
    /// run under the interactive debugger
    #[arg(short = 'd', long = "debug")]
    debug: bool,
    /// print a frame-walked stack trace on runtime errors
    #[arg(short = 't', long = "trace")]
    trace: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let bytes = match std::fs::read(&args.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.image.display());
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Interpreter::stdio().with_args(args.args);
    if args.debug {
        vm = vm.with_debugger();
    }
    if args.trace {
        vm = vm.with_stack_traces();
    }

    if let Err(e) = vm.load_bytes(&bytes) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = vm.run() {
        eprintln!("Execution failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
