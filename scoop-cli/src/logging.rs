//! Logger bootstrap for the CLI.

use flexi_logger::{Logger, LoggerHandle};

use crate::CliError;

const DEFAULT_LOG_SPEC: &str = "warn";

/// Start logging to standard error with `spec`, or `warn` when unset.
///
/// The returned handle must stay alive for the duration of the command.
pub(crate) fn init(spec: Option<&str>) -> Result<LoggerHandle, CliError> {
    let handle = Logger::try_with_str(spec.unwrap_or(DEFAULT_LOG_SPEC))?
        .log_to_stderr()
        .start()?;
    Ok(handle)
}
