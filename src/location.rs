//! Source positions attached to every check.

use std::fmt;

/// A `file!()`/`line!()` pair captured at the call site of a check macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.file, self.line)
    }
}

/// Expands to the [`SourceLocation`] of the macro invocation.
#[macro_export]
macro_rules! here {
    () => {
        $crate::SourceLocation::new(file!(), line!())
    };
}
