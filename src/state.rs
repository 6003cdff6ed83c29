//! Per-thread exception state: the active error code and its formatted
//! message.
//!
//! Every thread lazily gets its own [`ExceptionState`] on first use, and it is
//! dropped (message included) when the thread exits. Nothing here is shared
//! between threads, so there is no locking.
//!
//! A code of [`NO_EXCEPTION`] means nothing is active. The message buffer is
//! replaced on every [`set`] and released on [`clear`], so no message outlives
//! the throw/catch cycle that produced it.


use core::cell::RefCell;
use core::fmt::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use crate::propagate;

/// The reserved code meaning "no active exception". It can never be thrown.
pub const NO_EXCEPTION: i32 = 0;

/// A snapshot of a thread's exception state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exception {
    code: i32,
    message: Option<String>,
}

impl Exception {
    pub(crate) const NONE: Exception = Exception {
        code: NO_EXCEPTION,
        message: None,
    };

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether this snapshot holds a thrown exception rather than the empty
    /// state.
    pub fn is_active(&self) -> bool {
        self.code != NO_EXCEPTION
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message} (code {})", self.code),
            None => write!(f, "(no message) (code {})", self.code),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ExceptionState {
    current: Exception,
}

impl ExceptionState {
    const fn new() -> Self {
        Self {
            current: Exception::NONE,
        }
    }

    fn replace(&mut self, code: i32, message: Option<String>) {
        // The old buffer is dropped here, exactly once.
        self.current = Exception { code, message };
    }
}

thread_local! {
    static STATE: RefCell<ExceptionState> = const { RefCell::new(ExceptionState::new()) };
}

/// Returns a copy of the calling thread's exception state.
///
/// Yields code [`NO_EXCEPTION`] and no message when nothing is active.
pub fn current() -> Exception {
    with_current(Exception::clone)
}

/// Borrows the calling thread's exception state without copying the message.
///
/// `f` must not throw or otherwise modify the state.
pub fn with_current<R>(f: impl FnOnce(&Exception) -> R) -> R {
    STATE.with(|state| f(&state.borrow().current))
}

/// Stores `code` and the formatted `message` as the calling thread's
/// exception, releasing whatever message was held before.
///
/// A missing or empty message is stored as no message. `code` may be
/// [`NO_EXCEPTION`], which resets the code while still replacing the message.
pub fn set(code: i32, message: Option<fmt::Arguments<'_>>) {
    // Formatting runs user `Display` impls, so it must finish before the
    // state is borrowed.
    let message = message.and_then(format_message);
    STATE.with(|state| state.borrow_mut().replace(code, message));
}

/// Releases the held message and resets the code to [`NO_EXCEPTION`].
pub fn clear() {
    // This may run during thread teardown, after the slot is gone.
    let _ = STATE.try_with(|state| state.borrow_mut().replace(NO_EXCEPTION, None));
}

/// Makes `exception` the calling thread's state again, dropping whatever was
/// there.
pub(crate) fn restore(exception: Exception) {
    STATE.with(|state| state.borrow_mut().current = exception);
}

/// Moves the exception out of the calling thread's state, leaving it cleared.
pub(crate) fn take() -> Exception {
    STATE.with(|state| core::mem::take(&mut state.borrow_mut().current))
}

fn format_message(args: fmt::Arguments<'_>) -> Option<String> {
    if let Some(literal) = args.as_str() {
        return (!literal.is_empty()).then(|| literal.to_owned());
    }

    let formatted = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut message = String::new();
        message.write_fmt(args).ok()?;
        Some(message)
    }));

    match formatted {
        Ok(Some(mut message)) if !message.is_empty() => {
            message.shrink_to_fit();
            Some(message)
        }
        Ok(_) => None,
        // A `Display` impl threw; that exception wins over the one being set.
        Err(payload) if propagate::is_transfer(&*payload) => panic::resume_unwind(payload),
        Err(_) => {
            trace!("formatting the exception message panicked, storing no message");
            None
        }
    }
}
