//! Test cases and their check primitives.
//!
//! A [`TestCase`] owns its identity (name and weight), its counters, and the
//! check operations that update them. Checks take the [`Reporter`] explicitly;
//! the macros in this crate find both through [`crate::current`].
//!
//! ## Counter invariants
//! - `passed <= checked` after every built-in check.
//! - Within one execution both counters only grow. The driver resets them
//!   before each execution so repeated runs report the same numbers.

use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::config::ExpectErrorPolicy;
use crate::location::SourceLocation;
use crate::report::{format_real, Failure, Reporter};

/// The body of a test case.
pub type Body = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// STATIC DECLARATIONS
// ============================================================================

/// A test declared with [`crate::test_case!`], collected before `main` runs.
#[derive(Debug)]
pub struct Declaration {
    pub name: &'static str,
    pub weight: f64,
    pub body: fn(),
}

impl Declaration {
    pub const fn new(name: &'static str, weight: f64, body: fn()) -> Self {
        Self { name, weight, body }
    }
}

inventory::collect!(Declaration);

// ============================================================================
// NUMBERS
// ============================================================================

/// A primitive number accepted by tolerance checks, widened to `f64`.
///
/// Wide integers (`i64`, `u64`, `usize`, `i128`, ...) convert with `as`, so
/// magnitudes beyond 2^53 lose precision.
pub trait Real {
    fn to_real(self) -> f64;
}

macro_rules! impl_real {
    ($($ty:ty),*) => {
        $(
            impl Real for $ty {
                fn to_real(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_real!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

// ============================================================================
// TEST CASE
// ============================================================================

/// One independently named, independently executed unit of checks.
///
/// Cases order and compare by name only.
pub struct TestCase {
    name: String,
    weight: f64,
    body: Body,
    checked: AtomicU64,
    passed: AtomicU64,
    aborted: AtomicBool,
}

impl TestCase {
    pub fn new(name: impl Into<String>, weight: f64, body: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            weight,
            body: Arc::new(body),
            checked: AtomicU64::new(0),
            passed: AtomicU64::new(0),
            aborted: AtomicBool::new(false),
        }
    }

    pub fn from_declaration(declaration: &Declaration) -> Self {
        Self::new(declaration.name, declaration.weight, declaration.body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn checked(&self) -> u64 {
        self.checked.load(AtomicOrdering::Relaxed)
    }

    pub fn passed(&self) -> u64 {
        self.passed.load(AtomicOrdering::Relaxed)
    }

    /// True once `fail!` has cut the current execution short.
    pub fn aborted(&self) -> bool {
        self.aborted.load(AtomicOrdering::Relaxed)
    }

    /// Runs the body. Only the driver should call this.
    pub fn execute(&self) {
        (self.body)()
    }

    pub(crate) fn reset(&self) {
        self.checked.store(0, AtomicOrdering::Relaxed);
        self.passed.store(0, AtomicOrdering::Relaxed);
        self.aborted.store(false, AtomicOrdering::Relaxed);
    }

    pub fn record_checked(&self) {
        self.checked.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_passed(&self) {
        self.passed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    // ------------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------------

    pub fn check(&self, out: &Reporter, condition: bool, expression: &str, location: SourceLocation) {
        self.record_checked();
        if condition {
            self.record_passed();
        } else {
            out.report(
                location,
                &Failure::Condition {
                    expression: expression.to_string(),
                },
            );
        }
    }

    /// Like [`TestCase::check`], reporting `message` instead of the expression text.
    pub fn check_message(&self, out: &Reporter, condition: bool, message: String, location: SourceLocation) {
        self.record_checked();
        if condition {
            self.record_passed();
        } else {
            out.report(location, &Failure::Message(message));
        }
    }

    pub fn check_equal<L, R>(
        &self,
        out: &Reporter,
        lhs: &L,
        rhs: &R,
        lhs_text: &str,
        rhs_text: &str,
        location: SourceLocation,
    ) where
        L: PartialEq<R> + Debug + ?Sized,
        R: Debug + ?Sized,
    {
        self.record_checked();
        if lhs == rhs {
            self.record_passed();
        } else {
            out.report(
                location,
                &Failure::NotEqual {
                    lhs_text: lhs_text.to_string(),
                    lhs: format!("{:?}", lhs),
                    rhs_text: rhs_text.to_string(),
                    rhs: format!("{:?}", rhs),
                },
            );
        }
    }

    /// Passes iff `|lhs - rhs| <= |minimum|`. A negative `minimum` is allowed.
    #[allow(clippy::too_many_arguments)]
    pub fn check_close_within<L, R, M>(
        &self,
        out: &Reporter,
        lhs: L,
        rhs: R,
        minimum: M,
        lhs_text: &str,
        rhs_text: &str,
        minimum_text: &str,
        location: SourceLocation,
    ) where
        L: Real,
        R: Real,
        M: Real,
    {
        let (lhs, rhs, minimum) = (lhs.to_real(), rhs.to_real(), minimum.to_real().abs());
        let difference = (lhs - rhs).abs();
        self.record_checked();
        if difference <= minimum {
            self.record_passed();
        } else {
            out.report(
                location,
                &Failure::NotWithin {
                    lhs_text: lhs_text.to_string(),
                    rhs_text: rhs_text.to_string(),
                    minimum_text: minimum_text.to_string(),
                    lhs: format_real(lhs),
                    rhs: format_real(rhs),
                    difference: format_real(difference),
                    minimum: format_real(minimum),
                },
            );
        }
    }

    /// Classifies the result of an operation expected to fail with `expected`.
    ///
    /// Under [`ExpectErrorPolicy::Lenient`] a non-matching error still counts as
    /// passed; the diagnostic is emitted either way.
    pub fn check_error(
        &self,
        out: &Reporter,
        outcome: ErrorOutcome,
        expected: &str,
        policy: ExpectErrorPolicy,
        location: SourceLocation,
    ) {
        self.record_checked();
        match outcome {
            ErrorOutcome::Matched => self.record_passed(),
            ErrorOutcome::Mismatched(actual) | ErrorOutcome::Panicked(actual) => {
                if policy == ExpectErrorPolicy::Lenient {
                    self.record_passed();
                }
                out.report(
                    location,
                    &Failure::UnexpectedError {
                        expected: expected.to_string(),
                        actual,
                    },
                );
            }
            ErrorOutcome::NotRaised => out.report(
                location,
                &Failure::NoError {
                    expected: expected.to_string(),
                },
            ),
        }
    }

    /// Records a failed check and marks the execution aborted. The caller is
    /// responsible for leaving the body (the `fail!` macro returns).
    pub fn fail(&self, out: &Reporter, message: String, location: SourceLocation) {
        self.record_checked();
        self.aborted.store(true, AtomicOrdering::Relaxed);
        out.report(location, &Failure::Message(message));
    }
}

impl Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("checked", &self.checked())
            .field("passed", &self.passed())
            .field("aborted", &self.aborted())
            .finish_non_exhaustive()
    }
}

impl PartialEq for TestCase {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TestCase {}

impl PartialOrd for TestCase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TestCase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// How an operation under `check_throws!` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorOutcome {
    /// Returned an error matching the expected pattern.
    Matched,
    /// Returned some other error, rendered with `Debug`.
    Mismatched(String),
    /// Panicked instead of returning.
    Panicked(String),
    /// Returned `Ok`.
    NotRaised,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CaptureSink;

    fn fixture() -> (TestCase, Reporter, CaptureSink) {
        let sink = CaptureSink::new();
        let reporter = Reporter::new(Box::new(sink.clone()));
        (TestCase::new("fixture", 1.0, || {}), reporter, sink)
    }

    fn at(line: u32) -> SourceLocation {
        SourceLocation::new("src/case.rs", line)
    }

    #[test]
    fn equal_values_pass_silently() {
        let (case, out, sink) = fixture();
        case.check_equal(&out, &5, &5, "five", "5", at(1));
        assert_eq!((case.checked(), case.passed()), (1, 1));
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn unequal_values_report_text_and_values() {
        let (case, out, sink) = fixture();
        case.check_equal(&out, &5, &6, "x", "6", at(12));
        assert_eq!((case.checked(), case.passed()), (1, 0));
        assert_eq!(sink.contents(), "src/case.rs(12): \"x\" [5] != \"6\" [6]\n");
    }

    #[test]
    fn equality_across_types_uses_partial_eq() {
        let (case, out, _sink) = fixture();
        let owned = String::from("abc");
        case.check_equal(&out, &owned, &"abc", "owned", "\"abc\"", at(1));
        assert_eq!(case.passed(), 1);
    }

    #[test]
    fn close_within_tolerance_passes() {
        let (case, out, sink) = fixture();
        case.check_close_within(&out, 5.0, 5.05, 0.1, "a", "b", "0.1", at(1));
        assert_eq!((case.checked(), case.passed()), (1, 1));
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn close_outside_tolerance_reports_difference() {
        let (case, out, sink) = fixture();
        case.check_close_within(&out, 5.0, 5.2, 0.1, "a", "b", "0.1", at(30));
        assert_eq!((case.checked(), case.passed()), (1, 0));
        let output = sink.contents();
        assert!(output.starts_with("src/case.rs(30): difference(a, b) > 0.1"));
        assert!(output.contains("0.2 > 0.1"), "{}", output);
    }

    #[test]
    fn negative_minimum_uses_its_magnitude() {
        let (case, out, _sink) = fixture();
        case.check_close_within(&out, 1, 2, -1, "1", "2", "-1", at(1));
        assert_eq!(case.passed(), 1);
    }

    #[test]
    fn tight_tolerance_failure_shows_the_real_difference() {
        let (case, out, sink) = fixture();
        case.check_close_within(&out, 1.0, 1.0 + 1e-13, 1e-14, "1.0", "1.0 + 1e-13", "1e-14", at(8));
        assert_eq!((case.checked(), case.passed()), (1, 0));
        let output = sink.contents();
        assert!(output.contains("==> |1 - 1.0000000000001| = 9.992007221626"), "{}", output);
        assert!(output.trim_end().ends_with("e-14 > 1e-14"), "{}", output);
        assert!(!output.contains("= 0 >"), "{}", output);
    }

    #[test]
    fn wide_integers_are_accepted() {
        let (case, out, sink) = fixture();
        let values = vec![1, 2, 3];
        case.check_close_within(&out, values.len(), 3, 1, "values.len()", "3", "1", at(1));
        case.check_close_within(&out, 10i64, 13u64, 2usize, "10", "13", "2", at(2));
        assert_eq!((case.checked(), case.passed()), (2, 1));
        assert!(sink.contents().contains("|10 - 13| = 3 > 2"));
    }

    #[test]
    fn nan_is_never_close() {
        let (case, out, _sink) = fixture();
        case.check_close_within(&out, f64::NAN, 0.0, 1.0, "nan", "0", "1", at(1));
        assert_eq!((case.checked(), case.passed()), (1, 0));
    }

    #[test]
    fn boolean_check_reports_expression() {
        let (case, out, sink) = fixture();
        case.check(&out, true, "1 < 2", at(1));
        case.check(&out, false, "2 < 1", at(2));
        assert_eq!((case.checked(), case.passed()), (2, 1));
        assert_eq!(sink.contents(), "src/case.rs(2): \"2 < 1\" failed\n");
    }

    #[test]
    fn message_check_reports_message() {
        let (case, out, sink) = fixture();
        case.check_message(&out, false, "value was 3".into(), at(4));
        assert_eq!(sink.contents(), "src/case.rs(4): value was 3\n");
    }

    #[test]
    fn mismatched_error_passes_with_warning_when_lenient() {
        let (case, out, sink) = fixture();
        case.check_error(
            &out,
            ErrorOutcome::Mismatched("Invalid(\"9\")".into()),
            "Error::Empty",
            ExpectErrorPolicy::Lenient,
            at(8),
        );
        assert_eq!((case.checked(), case.passed()), (1, 1));
        assert_eq!(
            sink.contents(),
            "src/case.rs(8): unexpected error Invalid(\"9\"), expected \"Error::Empty\"\n"
        );
    }

    #[test]
    fn mismatched_error_fails_when_strict() {
        let (case, out, _sink) = fixture();
        case.check_error(
            &out,
            ErrorOutcome::Panicked("panic: boom".into()),
            "Error::Empty",
            ExpectErrorPolicy::Strict,
            at(8),
        );
        assert_eq!((case.checked(), case.passed()), (1, 0));
    }

    #[test]
    fn missing_error_always_fails() {
        let (case, out, sink) = fixture();
        case.check_error(&out, ErrorOutcome::NotRaised, "Error::Empty", ExpectErrorPolicy::Lenient, at(9));
        case.check_error(&out, ErrorOutcome::Matched, "Error::Empty", ExpectErrorPolicy::Lenient, at(10));
        assert_eq!((case.checked(), case.passed()), (2, 1));
        assert_eq!(sink.contents(), "src/case.rs(9): no error returned, expected \"Error::Empty\"\n");
    }

    #[test]
    fn fail_counts_a_failed_check_and_aborts() {
        let (case, out, sink) = fixture();
        case.fail(&out, "giving up".into(), at(3));
        assert!(case.aborted());
        assert_eq!((case.checked(), case.passed()), (1, 0));
        assert_eq!(sink.contents(), "src/case.rs(3): giving up\n");
    }

    #[test]
    fn reset_clears_counters_and_abort_flag() {
        let (case, out, _sink) = fixture();
        case.check(&out, true, "true", at(1));
        case.fail(&out, "stop".into(), at(2));
        case.reset();
        assert_eq!((case.checked(), case.passed(), case.aborted()), (0, 0, false));
    }

    #[test]
    fn cases_order_and_compare_by_name_only() {
        let apple = TestCase::new("Apple", 2.0, || {});
        let zebra = TestCase::new("Zebra", 1.0, || {});
        let other_apple = TestCase::new("Apple", 5.0, || {});
        assert!(apple < zebra);
        assert_eq!(apple, other_apple);
        assert!(!(apple < other_apple));
    }

    #[test]
    fn declaration_becomes_a_fresh_case() {
        fn body() {}
        let declaration = Declaration::new("declared", 2.5, body);
        let case = TestCase::from_declaration(&declaration);
        assert_eq!(case.name(), "declared");
        assert_eq!(case.weight(), 2.5);
        assert_eq!((case.checked(), case.passed()), (0, 0));
    }
}
