//! Failure formatting and output routing.
//!
//! Every failure diagnostic is a single line that starts with the location tag
//! produced by [`format_location`], so editors can jump straight to the check.
//! Lines go to the display sink (any [`WriteColor`]) and are mirrored, without
//! color, to the optional log sink.

use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

use crate::error::HarnessError;
use crate::location::SourceLocation;

// ============================================================================
// FORMATTING
// ============================================================================

/// Renders the `"<file>(<line>): "` tag that prefixes every failure line.
pub fn format_location(file: &str, line: u32) -> String {
    format!("{}({}): ", file, line)
}

const SIGNIFICANT_DIGITS: usize = 15;

/// Renders a real number rounded to fifteen significant digits, so
/// floating-point noise does not leak into diagnostics (`5.2 - 5.0` prints
/// `0.2`). Magnitudes below `1e-6` or from `1e16` up use exponent form.
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let rounded = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value)
        .parse::<f64>()
        .unwrap_or(value);
    let magnitude = rounded.abs();
    if !(1e-6..1e16).contains(&magnitude) {
        format!("{:e}", rounded)
    } else {
        rounded.to_string()
    }
}

/// Folds a multi-line message onto one line, joining its trimmed lines with ` | `.
fn single_line(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// What went wrong in a single check. The `Display` form is the part of the
/// diagnostic that follows the location tag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    #[error("\"{expression}\" failed")]
    Condition { expression: String },

    #[error("{0}")]
    Message(String),

    #[error("\"{lhs_text}\" [{lhs}] != \"{rhs_text}\" [{rhs}]")]
    NotEqual {
        lhs_text: String,
        lhs: String,
        rhs_text: String,
        rhs: String,
    },

    #[error("difference({lhs_text}, {rhs_text}) > {minimum_text} ==> |{lhs} - {rhs}| = {difference} > {minimum}")]
    NotWithin {
        lhs_text: String,
        rhs_text: String,
        minimum_text: String,
        lhs: String,
        rhs: String,
        difference: String,
        minimum: String,
    },

    #[error("unexpected error {actual}, expected \"{expected}\"")]
    UnexpectedError { expected: String, actual: String },

    #[error("no error returned, expected \"{expected}\"")]
    NoError { expected: String },

    #[error("\"{case}\" panicked: {message}")]
    Panicked { case: String, message: String },
}

/// Final status word printed for each case in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
    Aborted,
    Panicked,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Aborted => "ABORTED",
            Status::Panicked => "PANICKED",
        }
    }

    fn color(self) -> Color {
        match self {
            Status::Pass => Color::Green,
            Status::Fail | Status::Panicked => Color::Red,
            Status::Aborted => Color::Yellow,
        }
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Append-only log file mirroring the display output.
pub struct LogSink {
    writer: BufWriter<File>,
}

impl LogSink {
    pub fn open(path: &Path) -> Result<Self, HarnessError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| HarnessError::LogSink {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, line: &str) -> Result<(), HarnessError> {
        writeln!(self.writer, "{}", line).map_err(HarnessError::LogWrite)
    }

    fn flush(&mut self) -> Result<(), HarnessError> {
        self.writer.flush().map_err(HarnessError::LogWrite)
    }
}

/// In-memory display sink. Clones share the same buffer, so a caller can hand
/// one clone to a [`Reporter`] and read the output back through another.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteColor for CaptureSink {
    fn supports_color(&self) -> bool {
        false
    }

    fn set_color(&mut self, _spec: &ColorSpec) -> io::Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// REPORTER
// ============================================================================

/// Routes harness output to the display sink and the optional log sink.
///
/// Display write errors are ignored. The first log write error is reported
/// once through `tracing` and the log sink is dropped, so the run continues
/// console-only.
pub struct Reporter {
    display: RefCell<Box<dyn WriteColor>>,
    log: RefCell<Option<LogSink>>,
    diagnostics: Cell<usize>,
}

impl Reporter {
    pub fn new(display: Box<dyn WriteColor>) -> Self {
        Self {
            display: RefCell::new(display),
            log: RefCell::new(None),
            diagnostics: Cell::new(0),
        }
    }

    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(Box::new(StandardStream::stdout(choice)))
    }

    pub fn attach_log(&self, sink: LogSink) {
        *self.log.borrow_mut() = Some(sink);
    }

    pub fn has_log(&self) -> bool {
        self.log.borrow().is_some()
    }

    /// Number of failure diagnostics emitted so far.
    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.get()
    }

    /// Writes one uncolored line to both sinks.
    pub fn line(&self, text: &str) {
        {
            let mut display = self.display.borrow_mut();
            let _ = writeln!(display, "{}", text);
        }
        self.mirror(text);
    }

    /// Writes a failure diagnostic for a check at `location`.
    pub fn report(&self, location: SourceLocation, failure: &Failure) {
        self.report_at(location.file, location.line, failure);
    }

    /// Writes a failure diagnostic for an arbitrary file/line pair. Line breaks
    /// in the failure text are folded so the diagnostic stays on one line.
    pub fn report_at(&self, file: &str, line: u32, failure: &Failure) {
        self.diagnostics.set(self.diagnostics.get() + 1);
        let text = single_line(&failure.to_string());
        self.line(&format!("{}{}", format_location(file, line), text));
    }

    /// Writes `text` followed by a colored status word.
    pub fn status_line(&self, text: &str, status: Status) {
        {
            let mut display = self.display.borrow_mut();
            let _ = write!(display, "{} ", text);
            let _ = display.set_color(ColorSpec::new().set_fg(Some(status.color())).set_bold(true));
            let _ = write!(display, "{}", status.label());
            let _ = display.reset();
            let _ = writeln!(display);
        }
        self.mirror(&format!("{} {}", text, status.label()));
    }

    pub fn flush(&self) {
        let _ = self.display.borrow_mut().flush();
        let result = match self.log.borrow_mut().as_mut() {
            Some(log) => log.flush(),
            None => Ok(()),
        };
        if let Err(error) = result {
            self.drop_log(&error);
        }
    }

    fn mirror(&self, text: &str) {
        let result = match self.log.borrow_mut().as_mut() {
            Some(log) => log.write_line(text),
            None => return,
        };
        if let Err(error) = result {
            self.drop_log(&error);
        }
    }

    fn drop_log(&self, error: &HarnessError) {
        tracing::warn!(%error, "log sink failed, continuing with console output only");
        *self.log.borrow_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> (Reporter, CaptureSink) {
        let sink = CaptureSink::new();
        (Reporter::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn location_tag_is_file_then_line_in_parentheses() {
        assert_eq!(format_location("src/lib.rs", 42), "src/lib.rs(42): ");
    }

    #[test]
    fn reals_drop_noise_and_trailing_zeros() {
        assert_eq!(format_real((5.2f64 - 5.0).abs()), "0.2");
        assert_eq!(format_real(0.1), "0.1");
        assert_eq!(format_real(2.0), "2");
        assert_eq!(format_real(-0.0), "0");
        assert_eq!(format_real(-1.5), "-1.5");
        assert_eq!(format_real(f64::NAN), "NaN");
    }

    #[test]
    fn tiny_reals_keep_their_significant_digits() {
        assert_eq!(format_real(1e-14), "1e-14");
        assert_eq!(format_real(-2.5e-9), "-2.5e-9");
        assert_eq!(format_real(1.0 + 1e-13), "1.0000000000001");
        assert_ne!(format_real((1.0f64 + 1e-13) - 1.0), "0");
        assert_eq!(format_real(1e20), "1e20");
    }

    #[test]
    fn multi_line_failures_fold_onto_the_tagged_line() {
        let (reporter, sink) = capture();
        let failure = Failure::Panicked {
            case: "eq".into(),
            message: "assertion `left == right` failed\n  left: 1\n right: 2".into(),
        };
        reporter.report_at("src/math.rs", 3, &failure);
        reporter.report_at("src/math.rs", 4, &Failure::Message("first\n\nsecond\n".into()));
        assert_eq!(
            sink.contents(),
            "src/math.rs(3): \"eq\" panicked: assertion `left == right` failed | left: 1 | right: 2\n\
             src/math.rs(4): first | second\n"
        );
    }

    #[test]
    fn equality_failure_shows_text_and_values() {
        let failure = Failure::NotEqual {
            lhs_text: "a + b".into(),
            lhs: "5".into(),
            rhs_text: "6".into(),
            rhs: "6".into(),
        };
        assert_eq!(failure.to_string(), "\"a + b\" [5] != \"6\" [6]");
    }

    #[test]
    fn every_diagnostic_starts_with_the_location_tag() {
        let (reporter, sink) = capture();
        let location = SourceLocation::new("tests/math.rs", 7);
        reporter.report(location, &Failure::Condition { expression: "x > 0".into() });
        reporter.report(location, &Failure::Message("custom".into()));
        reporter.report(location, &Failure::NoError { expected: "Error::Empty".into() });

        let output = sink.contents();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.starts_with("tests/math.rs(7): "), "{}", line);
        }
        assert_eq!(lines[0], "tests/math.rs(7): \"x > 0\" failed");
        assert_eq!(reporter.diagnostic_count(), 3);
    }

    #[test]
    fn status_lines_are_plain_on_colorless_sinks() {
        let (reporter, sink) = capture();
        reporter.status_line("\"Apple\": 1/1 passed, weight 1", Status::Pass);
        assert_eq!(sink.contents(), "\"Apple\": 1/1 passed, weight 1 PASS\n");
    }

    #[test]
    fn log_sink_mirrors_display_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let (reporter, sink) = capture();
        reporter.attach_log(LogSink::open(&path).unwrap());
        reporter.line("hello");
        reporter.status_line("case", Status::Fail);
        reporter.flush();

        let logged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(logged, "hello\ncase FAIL\n");
        assert_eq!(sink.contents(), logged);
    }

    #[test]
    fn log_sink_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        for text in ["first", "second"] {
            let (reporter, _sink) = capture();
            reporter.attach_log(LogSink::open(&path).unwrap());
            reporter.line(text);
            reporter.flush();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn unopenable_log_sink_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("run.log");
        let error = LogSink::open(&missing).err().unwrap();
        assert!(matches!(error, HarnessError::LogSink { .. }));
    }
}
