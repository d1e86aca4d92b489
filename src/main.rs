//! lanes - Local-first client tracking in ranked swimlanes

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = lanes_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
