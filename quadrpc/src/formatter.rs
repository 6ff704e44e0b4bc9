use colored::*;
use quadrpc_core::drivers::DriverError;
use quadrpc_core::session::SessionReport;
use quadrpc_core::tonic::Status;
use quadrpc_core::{CallError, SessionError};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<String> for FormattedString {
    fn from(value: String) -> Self {
        FormattedString(value)
    }
}

impl From<Status> for FormattedString {
    fn from(status: Status) -> Self {
        FormattedString(format!(
            "{} code={:?} message={:?}",
            "gRPC Failed:".red().bold(),
            status.code(),
            status.message()
        ))
    }
}

impl From<CallError> for FormattedString {
    fn from(err: CallError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Connection Error:".red().bold(), err))
    }
}

impl From<DriverError> for FormattedString {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Status(status) => FormattedString::from(status),
            DriverError::Call(err) => FormattedString::from(err),
            other => FormattedString(format!("{}\n\n'{}'", "Call Failed:".red().bold(), other)),
        }
    }
}

impl From<SessionError> for FormattedString {
    fn from(err: SessionError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Stream Session Failed:".red().bold(),
            err
        ))
    }
}

impl From<SessionReport> for FormattedString {
    fn from(report: SessionReport) -> Self {
        let summary = format!(
            "{} sent={} dropped={} reconnects={}",
            "Stream session closed:".green(),
            report.sent,
            report.dropped,
            report.reconnects
        );

        match report.response {
            Ok(response) => FormattedString(format!("{summary}\n{response}")),
            Err(status) => FormattedString(format!(
                "{summary}\n{}",
                FormattedString::from(status).0
            )),
        }
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}
