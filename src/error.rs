//! Harness-level errors.
//!
//! Check failures are not errors in this sense: they are counted and reported
//! through [`crate::report::Failure`]. The variants here cover the plumbing around a
//! run, none of which is allowed to stop the cases from executing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or writing the harness output sinks.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot open log file {}: {source}", .path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write to log file: {0}")]
    LogWrite(#[source] io::Error),
}
