//! The process-wide collection of test cases.
//!
//! Cases declared with [`crate::test_case!`] are collected by `inventory` before
//! `main` runs. The global [`Registry`] turns those declarations into
//! [`TestCase`]s the first time it is touched, so no declaration can be missed
//! because of initialization order between compilation units.
//!
//! ## Registry Invariant
//! Membership is append-only and never holds the same case instance twice.
//! Drivers take a snapshot of [`Registry::all`] and sort it themselves;
//! registration order is kept here as declared.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

use crate::case::{Declaration, TestCase};

static GLOBAL: Lazy<Mutex<Registry>> = Lazy::new(|| {
    let registry = Registry::from_declarations(inventory::iter::<Declaration>);
    tracing::debug!(cases = registry.len(), "materialized test registry");
    Mutex::new(registry)
});

/// An ordered, append-only list of test cases.
#[derive(Debug, Default)]
pub struct Registry {
    cases: Vec<Arc<TestCase>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declarations<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> Self {
        let mut registry = Self::new();
        for declaration in declarations {
            registry.register(Arc::new(TestCase::from_declaration(declaration)));
        }
        registry
    }

    /// The registry holding every statically declared case.
    ///
    /// The lock is recovered if a previous holder panicked; the case list is
    /// never left half-updated.
    pub fn global() -> MutexGuard<'static, Registry> {
        GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `case`. Registering the same instance again is a no-op; distinct
    /// cases with equal names are both kept.
    pub fn register(&mut self, case: Arc<TestCase>) {
        if self.cases.iter().any(|known| Arc::ptr_eq(known, &case)) {
            return;
        }
        tracing::debug!(case = case.name(), weight = case.weight(), "registered test case");
        self.cases.push(case);
    }

    pub fn all(&self) -> &[Arc<TestCase>] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
