use std::process::ExitCode;

use crate::core::AnalysisOutcome;

/// Exit status for CLI commands, following common conventions for linter
/// tools.
///
/// - `Success` (0): Analysis completed, manifest is complete
/// - `Failure` (1): Analysis completed but found fatal issues
/// - `Error` (2): Command failed due to internal error (config error, I/O
///   error, etc.)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl ExitStatus {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        if outcome.has_fatal_issues() {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
