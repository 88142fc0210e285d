//! Command dispatch for the varia CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::args::{AnalyzeCommand, Arguments, Command};
use super::exit_status::ExitStatus;
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::core::{Aggregator, AnalyzeOptions};
use crate::discovery::discover_files;
use crate::report;

/// Main entry point for the varia CLI.
///
/// Dispatches to the appropriate command handler based on the parsed
/// arguments. Returns the exit status the process should report; `Err` means
/// an internal error (bad config, unreadable root) rather than analysis
/// findings.
pub fn run(args: Arguments) -> Result<ExitStatus> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success);
    };

    match args.command {
        Some(Command::Analyze(cmd)) => analyze(cmd),
        None => unreachable!("with_command_or_help returned Some without a command"),
    }
}

fn analyze(cmd: AnalyzeCommand) -> Result<ExitStatus> {
    let config = Config::load(Path::new(CONFIG_FILE_NAME))?;
    config.validate()?;

    let source_root = cmd
        .common
        .source_root
        .unwrap_or_else(|| PathBuf::from(&config.source_root));

    let discovered = discover_files(
        &source_root,
        &config.includes,
        &config.ignores,
        config.ignore_test_files,
        cmd.common.verbose,
    );
    if cmd.common.verbose && discovered.skipped_count > 0 {
        eprintln!("Skipped {} inaccessible path(s)", discovered.skipped_count);
    }

    let mut extra_keys = config.extra_keys.clone();
    for key in cmd.extra_keys {
        if !extra_keys.contains(&key) {
            extra_keys.push(key);
        }
    }
    let options = AnalyzeOptions {
        hooks: config.hooks.clone(),
        extra_keys,
    };

    let outcome = Aggregator::with_default_cache().aggregate(&discovered.files, &options);

    if cmd.json {
        println!("{}", report::render_json(&outcome.manifest)?);
        // Keep stdout machine-readable; diagnostics go to stderr.
        report::report_to(&outcome, discovered.files.len(), &mut std::io::stderr().lock());
    } else {
        report::report(&outcome, discovered.files.len());
    }

    Ok(ExitStatus::from_outcome(&outcome))
}
