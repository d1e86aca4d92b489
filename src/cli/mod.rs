//! CLI command implementations

mod app;
mod board;
mod client;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
