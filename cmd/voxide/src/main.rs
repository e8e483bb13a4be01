//! Voxide: a voxel logic simulator.

mod bench;
mod cli;
mod command;
mod initializers;
mod repl;

use clap::Parser as ClapParser;
use voxide_engine::StdoutPrinter;

fn main() {
    let cli = cli::Cli::parse();
    initializers::init_tracing();

    let (mut world, host) = match initializers::init_world(&cli) {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    };

    let mut printer = StdoutPrinter { muted: cli.silent };

    if let Some(millis) = cli.benchmark {
        bench::run(&mut world, &host, millis, &mut printer);
        return;
    }

    if let Some(port) = cli.port {
        if let Err(error) = repl::run_network(&mut world, &host, port) {
            eprintln!("{error}");
            std::process::exit(1);
        }
        return;
    }

    if cli.interactive {
        if let Err(error) = repl::run_interactive(&mut world, &host, &mut printer) {
            eprintln!("{error}");
            std::process::exit(1);
        }
        return;
    }

    repl::run_stdin(&mut world, &host, &mut printer);
}
