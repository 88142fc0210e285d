//! Command-line interface layer.

pub mod args;
pub mod exit_status;
pub mod run;

pub use args::{AnalyzeCommand, Arguments, Command, CommonArgs};
pub use exit_status::ExitStatus;
pub use run::run as run_cli;
