//! Declaration and assertion macros.
//!
//! All check macros capture `file!()`/`line!()` and the literal source text of
//! their operands, then find the running case through [`crate::current`]. They
//! may be used anywhere on the driver's thread while a case is running, not
//! only lexically inside a `test_case!` body.

/// Declares a self-registering test case.
///
/// ```rust,ignore
/// tally::test_case!(parses_empty_input, {
///     tally::check!(parse("").is_err());
/// });
///
/// tally::test_case!(weighted_case, weight = 2.0, {
///     tally::check_equal!(1 + 1, 2);
/// });
/// ```
///
/// The identifier becomes both the case name and the name of the generated
/// body function.
#[macro_export]
macro_rules! test_case {
    ($name:ident, weight = $weight:expr, $body:block $(,)?) => {
        #[allow(non_snake_case)]
        fn $name() $body

        $crate::inventory::submit! {
            $crate::Declaration::new(stringify!($name), $weight, $name)
        }
    };
    ($name:ident, $body:block $(,)?) => {
        $crate::test_case!($name, weight = 1.0, $body);
    };
}

/// Checks that a boolean expression holds.
#[macro_export]
macro_rules! check {
    ($condition:expr $(,)?) => {{
        let location = $crate::here!();
        let condition: bool = $condition;
        $crate::current(location).check(condition, stringify!($condition), location)
    }};
}

/// Checks a boolean expression, reporting a formatted message on failure.
/// The message is only formatted when the check fails.
#[macro_export]
macro_rules! check_message {
    ($condition:expr, $($message:tt)+) => {{
        let location = $crate::here!();
        let condition: bool = $condition;
        let message = if condition {
            ::std::string::String::new()
        } else {
            ::std::format!($($message)+)
        };
        $crate::current(location).check_message(condition, message, location)
    }};
}

/// Checks that two values are equal, reporting both source texts and `Debug` values.
#[macro_export]
macro_rules! check_equal {
    ($actual:expr, $expected:expr $(,)?) => {{
        let location = $crate::here!();
        match (&$actual, &$expected) {
            (actual, expected) => $crate::current(location).check_equal(
                actual,
                expected,
                stringify!($actual),
                stringify!($expected),
                location,
            ),
        }
    }};
}

/// Checks that `|actual - expected| <= |minimum|`.
#[macro_export]
macro_rules! check_within {
    ($actual:expr, $expected:expr, $minimum:expr $(,)?) => {{
        let location = $crate::here!();
        $crate::current(location).check_close_within(
            $actual,
            $expected,
            $minimum,
            stringify!($actual),
            stringify!($expected),
            stringify!($minimum),
            location,
        )
    }};
}

/// Checks that an expression evaluating to a `Result` fails with an error
/// matching `$expected`.
///
/// `Ok` is a failure. An error that does not match, or a panic, is reported
/// and classified by the run's [`crate::ExpectErrorPolicy`].
#[macro_export]
macro_rules! check_throws {
    ($operation:expr, $expected:pat $(,)?) => {{
        let location = $crate::here!();
        let outcome = match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $operation)) {
            ::std::result::Result::Ok(::std::result::Result::Ok(_)) => $crate::ErrorOutcome::NotRaised,
            ::std::result::Result::Ok(::std::result::Result::Err(error)) => {
                match error {
                    $expected => $crate::ErrorOutcome::Matched,
                    #[allow(unreachable_patterns)]
                    other => $crate::ErrorOutcome::Mismatched(::std::format!("{:?}", other)),
                }
            }
            ::std::result::Result::Err(payload) => {
                $crate::ErrorOutcome::Panicked(::std::format!("panic: {}", $crate::payload_message(&*payload)))
            }
        };
        $crate::current(location).check_error(outcome, stringify!($expected), location)
    }};
}

/// Records a failed check with a formatted message and returns from the
/// enclosing test body. Nothing after it in the body runs.
#[macro_export]
macro_rules! fail {
    ($($message:tt)+) => {{
        let location = $crate::here!();
        $crate::current(location).fail(::std::format!($($message)+), location);
        return;
    }};
}

/// Generates a `main` that runs every declared case and exits with the run status.
#[macro_export]
macro_rules! tally_main {
    () => {
        fn main() {
            ::std::process::exit($crate::run());
        }
    };
}
