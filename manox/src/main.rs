//! `manox`: assembles a Mano basic computer source file and runs it to
//! completion, the way the teacher's `vex`/`vasm` binaries chained
//! assembling and running — except here both stages live in one binary
//! instead of going through an intermediate `.vex` file, since that binary
//! container format has no counterpart in this rework.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mano::{Cpu, Memory, StepState};

/// Assemble and run a Mano basic computer program.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Assembly source file to assemble and run.
    program: PathBuf,

    /// Print a trace line for every micro-op instead of just the final state.
    #[arg(short, long)]
    trace: bool,

    /// Maximum number of micro-ops to execute before giving up.
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    max_steps: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match fs::read_to_string(&args.program) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("reading \"{}\" failed: {}", args.program.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let assembled = masm::assemble(&source);
    if !assembled.success {
        eprintln!("assembling \"{}\" failed:", args.program.display());
        for error in &assembled.errors {
            eprintln!("  {}", error);
        }
        return ExitCode::FAILURE;
    }

    let mut memory = Memory::new();
    memory.load_program(&assembled.machine_code);

    let mut cpu = Cpu::new();
    cpu.set_pc(assembled.start_address);
    cpu.set_on_output(|byte| {
        print!("{}", byte as char);
        let _ = io::stdout().flush();
    });
    cpu.set_on_input_required(|| {
        let mut buf = [0u8; 1];
        match io::stdin().read_exact(&mut buf) {
            Ok(()) => Some(buf[0]),
            Err(_) => None,
        }
    });

    let mut steps = 0u64;
    while cpu.is_running() {
        if steps >= args.max_steps {
            eprintln!("stopped after {} micro-ops without halting", steps);
            return ExitCode::FAILURE;
        }
        let result = cpu.step(&mut memory);
        if args.trace {
            eprintln!(
                "sc={} pc={:#05x} ar={:#05x} ac={:#06x} dr={:#06x} ir={:#06x} | {}",
                result.sc, result.pc, result.ar, result.ac, result.dr, result.ir, result.message
            );
        }
        if result.state == StepState::WaitingForInput {
            log::warn!("CPU waiting for input but no byte was available on stdin");
            return ExitCode::FAILURE;
        }
        if result.output.is_some() {
            cpu.set_output_ready();
        }
        steps += 1;
    }

    eprintln!("halted after {} micro-ops", steps);
    ExitCode::SUCCESS
}
