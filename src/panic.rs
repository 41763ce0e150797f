//! Panic capture for test bodies.
//!
//! A process-wide hook is installed once. While a thread is capturing (the
//! driver is running a body on it) the hook records the panic location and
//! message for that thread and stays quiet; everywhere else it defers to the
//! hook that was installed before it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

static PANIC_HOOK_INIT: Once = Once::new();

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<CapturedPanic>> = const { RefCell::new(None) };
}

/// A panic caught at the driver boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPanic {
    /// File and line of the `panic!`, when the hook saw it.
    pub location: Option<(String, u32)>,
    pub message: String,
}

/// Renders a panic payload the way the standard hook does.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub(crate) fn install_hook() {
    PANIC_HOOK_INIT.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }
            let captured = CapturedPanic {
                location: info.location().map(|at| (at.file().to_string(), at.line())),
                message: payload_message(info.payload()),
            };
            tracing::debug!(message = %captured.message, "captured panic in test body");
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(captured));
        }));
    });
}

/// Marks the current thread as capturing until dropped.
pub(crate) struct CaptureGuard {
    previous: bool,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURING.with(|flag| flag.set(self.previous));
    }
}

pub(crate) fn capture() -> CaptureGuard {
    install_hook();
    LAST_PANIC.with(|slot| slot.borrow_mut().take());
    CaptureGuard {
        previous: CAPTURING.with(|flag| flag.replace(true)),
    }
}

/// Runs `body`, turning an unwinding panic into a [`CapturedPanic`].
pub(crate) fn catch(body: impl FnOnce()) -> Result<(), CapturedPanic> {
    panic::catch_unwind(AssertUnwindSafe(body)).map_err(|payload| {
        let message = payload_message(&*payload);
        let location = LAST_PANIC
            .with(|slot| slot.borrow_mut().take())
            .and_then(|captured| captured.location);
        CapturedPanic { location, message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_messages_cover_str_and_string() {
        let payload: Box<dyn Any + Send> = Box::new("plain");
        assert_eq!(payload_message(&*payload), "plain");
        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 3"));
        assert_eq!(payload_message(&*payload), "formatted 3");
        let payload: Box<dyn Any + Send> = Box::new(17u8);
        assert_eq!(payload_message(&*payload), "non-string panic payload");
    }

    #[test]
    fn catch_reports_message_and_location() {
        let _guard = capture();
        let expected_line = line!() + 1;
        let result = catch(|| panic!("boom {}", 7));
        let captured = result.unwrap_err();
        assert_eq!(captured.message, "boom 7");
        assert_eq!(captured.location, Some((file!().to_string(), expected_line)));
    }

    #[test]
    fn catch_passes_through_normal_returns() {
        let _guard = capture();
        assert!(catch(|| {}).is_ok());
    }

    #[test]
    fn guard_restores_capture_flag() {
        {
            let _outer = capture();
            {
                let _inner = capture();
            }
            assert!(CAPTURING.with(Cell::get));
        }
        assert!(!CAPTURING.with(Cell::get));
    }
}
