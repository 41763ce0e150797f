//! Finding the test case that is currently running.
//!
//! The driver activates one case at a time on its thread; the check macros
//! look it up here instead of taking the case as an argument. The slot is
//! thread-local, so independent drivers on different threads never see each
//! other's cases. A check made while no case is active is a programmer error
//! and panics immediately with the call site.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Arc;

use crate::case::{ErrorOutcome, Real, TestCase};
use crate::config::ExpectErrorPolicy;
use crate::location::SourceLocation;
use crate::report::{format_location, Reporter};

thread_local! {
    static ACTIVE: RefCell<Option<Current>> = const { RefCell::new(None) };
}

/// Handle on the active case together with the reporter it writes to.
#[derive(Clone)]
pub struct Current {
    case: Arc<TestCase>,
    reporter: Rc<Reporter>,
    policy: ExpectErrorPolicy,
}

/// Returns the active case, or panics naming `location` if there is none.
pub fn current(location: SourceLocation) -> Current {
    match ACTIVE.with(|slot| slot.borrow().clone()) {
        Some(current) => current,
        None => panic!(
            "{}check called outside of a running test case",
            format_location(location.file, location.line)
        ),
    }
}

/// True while the driver is running a case on this thread.
pub fn is_active() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

/// Clears (restores) the active slot when dropped, including during unwinding.
pub(crate) struct ActiveGuard {
    previous: Option<Current>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|slot| *slot.borrow_mut() = previous);
    }
}

pub(crate) fn activate(current: Current) -> ActiveGuard {
    ActiveGuard {
        previous: ACTIVE.with(|slot| slot.borrow_mut().replace(current)),
    }
}

impl Current {
    pub(crate) fn new(case: Arc<TestCase>, reporter: Rc<Reporter>, policy: ExpectErrorPolicy) -> Self {
        Self { case, reporter, policy }
    }

    pub fn case(&self) -> &TestCase {
        &self.case
    }

    pub fn name(&self) -> &str {
        self.case.name()
    }

    /// Writes an informational line to the display and log sinks.
    pub fn display_line(&self, text: &str) {
        self.reporter.line(text);
    }

    pub fn record_checked(&self) {
        self.case.record_checked();
    }

    pub fn record_passed(&self) {
        self.case.record_passed();
    }

    pub fn check(&self, condition: bool, expression: &str, location: SourceLocation) {
        self.case.check(&self.reporter, condition, expression, location);
    }

    pub fn check_message(&self, condition: bool, message: String, location: SourceLocation) {
        self.case.check_message(&self.reporter, condition, message, location);
    }

    pub fn check_equal<L, R>(&self, lhs: &L, rhs: &R, lhs_text: &str, rhs_text: &str, location: SourceLocation)
    where
        L: PartialEq<R> + Debug + ?Sized,
        R: Debug + ?Sized,
    {
        self.case.check_equal(&self.reporter, lhs, rhs, lhs_text, rhs_text, location);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn check_close_within<L, R, M>(
        &self,
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
        self.case.check_close_within(
            &self.reporter,
            lhs,
            rhs,
            minimum,
            lhs_text,
            rhs_text,
            minimum_text,
            location,
        );
    }

    pub fn check_error(&self, outcome: ErrorOutcome, expected: &str, location: SourceLocation) {
        self.case.check_error(&self.reporter, outcome, expected, self.policy, location);
    }

    pub fn fail(&self, message: String, location: SourceLocation) {
        self.case.fail(&self.reporter, message, location);
    }
}
