//! Tally: a small unit-test harness.
//!
//! Test cases register themselves with [`test_case!`]; a [`Driver`] runs them
//! in name order, one at a time, and prints a per-case and weighted aggregate
//! summary. Checks ([`check!`], [`check_equal!`], [`check_within!`], ...) find
//! the running case on their own and print one `file(line): ...` line per
//! failure.
//!
//! ```rust,ignore
//! tally::test_case!(addition, {
//!     tally::check_equal!(2 + 2, 4);
//!     tally::check_within!(0.1 + 0.2, 0.3, 1e-9);
//! });
//!
//! tally::tally_main!();
//! ```

pub use crate::case::{Body, Declaration, ErrorOutcome, Real, TestCase};
pub use crate::cli::{run, run_with_config, HarnessArgs};
pub use crate::config::{ColorMode, ExpectErrorPolicy, HarnessConfig};
pub use crate::driver::{weighted_score, CaseReport, Driver, RunSummary, Termination};
pub use crate::error::HarnessError;
pub use crate::locator::{current, is_active, Current};
pub use crate::location::SourceLocation;
pub use crate::panic::{payload_message, CapturedPanic};
pub use crate::registry::Registry;
pub use crate::report::{format_location, format_real, CaptureSink, Failure, LogSink, Reporter, Status};

#[doc(hidden)]
pub use inventory;

mod macros;

pub mod case;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod locator;
pub mod location;
pub mod panic;
pub mod registry;
pub mod report;
