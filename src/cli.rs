//! Host entry point for test binaries.
//!
//! Parses the command line with `clap`, installs a `tracing` subscriber, and
//! hands a [`HarnessConfig`] to the [`Driver`]. The core itself never reads
//! arguments or the environment.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{ColorMode, ExpectErrorPolicy, HarnessConfig};
use crate::driver::Driver;

/// Command-line options of a tally test binary.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Runs every declared test case in name order.")]
pub struct HarnessArgs {
    /// Append a copy of the output to this file.
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// When to color the summary.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Count an error of the wrong kind in `check_throws!` as a failure.
    #[arg(long)]
    pub strict_expect_error: bool,
}

impl From<HarnessArgs> for HarnessConfig {
    fn from(args: HarnessArgs) -> Self {
        let expect_error = if args.strict_expect_error {
            ExpectErrorPolicy::Strict
        } else {
            ExpectErrorPolicy::Lenient
        };
        Self {
            log_path: args.log,
            color: args.color,
            expect_error,
        }
    }
}

/// Parses the process arguments, runs all declared cases and returns the exit status.
pub fn run() -> i32 {
    init_tracing();
    run_with_config(HarnessArgs::parse().into())
}

/// Runs all declared cases with an explicit configuration.
pub fn run_with_config(config: HarnessConfig) -> i32 {
    let mut driver = Driver::new(config);
    driver.setup();
    driver.execute().exit_code()
}

/// Installs a stderr subscriber filtered by `RUST_LOG` (default `warn`),
/// unless the host already installed one.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
