use ls8::computer::trace::HexTracer;
use ls8::computer::Computer;
use ls8::config::Config;
use ls8::loader;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use eyre::Result;
use simple_logger::SimpleLogger;

/// Run an LS-8 program
#[derive(Parser)]
struct Args {
    /// Program file, one binary literal per line
    program: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    SimpleLogger::new()
        .with_level(config.log_level)
        .env()
        .init()?;

    let program = match loader::load_file_with(&args.program, &config.loader_options()) {
        Ok(program) => program,
        Err(err) if err.is_missing_source() => {
            let invoked_as = env::args().next().unwrap_or_else(|| "ls8".to_string());
            println!("{invoked_as}: {err}");
            process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    let mut computer = Computer::new();
    computer.load_program(&program)?;

    if config.trace {
        computer.set_tracer(Box::new(HexTracer::new(io::stderr())));
    }

    let stdout = io::stdout();
    let summary = computer.run(&mut stdout.lock())?;
    log::debug!(
        "halted at {:#04x} after {} instructions",
        summary.halted_at,
        summary.steps
    );

    Ok(())
}
