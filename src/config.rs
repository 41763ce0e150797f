//! Run configuration.
//!
//! The core never reads arguments or the environment on its own. Hosts build a
//! [`HarnessConfig`] (the bundled CLI does it from `clap` arguments) and hand it
//! to the [`crate::Driver`].

use std::path::PathBuf;

use clap::ValueEnum;
use termcolor::ColorChoice;

/// When to color the status words of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Color only when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolves the mode against the current stdout.
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// How `check_throws!` classifies an error that does not match the expected pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpectErrorPolicy {
    /// A mismatched error (or a panic) counts as passed, with a warning diagnostic.
    #[default]
    Lenient,
    /// A mismatched error (or a panic) counts as failed.
    Strict,
}

/// Configuration for a single harness run.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Append-only file mirroring the console output. Best effort.
    pub log_path: Option<PathBuf>,
    pub color: ColorMode,
    pub expect_error: ExpectErrorPolicy,
}

impl HarnessConfig {
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn with_expect_error(mut self, policy: ExpectErrorPolicy) -> Self {
        self.expect_error = policy;
        self
    }
}
