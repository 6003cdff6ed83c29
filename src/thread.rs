//! Worker threads whose uncaught exceptions end only themselves.
//!
//! Joining a worker gives `Err(Uncaught)` carrying the thrown code when the
//! worker died of an exception. Panics still propagate to the joiner.

use std::io;
use std::panic;

use crate::termination::{self, Uncaught};

/// Thread factory, mirroring [`std::thread::Builder`].
#[derive(Debug)]
pub struct Builder {
    inner: std::thread::Builder,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            inner: std::thread::Builder::new(),
        }
    }

    pub fn name(self, name: String) -> Self {
        Self {
            inner: self.inner.name(name),
        }
    }

    pub fn stack_size(self, size: usize) -> Self {
        Self {
            inner: self.inner.stack_size(size),
        }
    }

    pub fn spawn<F, T>(self, f: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.spawn(move || termination::catch_uncaught(f))?;
        Ok(JoinHandle { inner })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns a worker thread.
///
/// # Panics
///
/// Panics if the OS fails to create a thread, like [`std::thread::spawn`].
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    JoinHandle {
        inner: std::thread::spawn(move || termination::catch_uncaught(f)),
    }
}

#[derive(Debug)]
pub struct JoinHandle<T> {
    inner: std::thread::JoinHandle<Result<T, Uncaught>>,
}

impl<T> JoinHandle<T> {
    pub fn thread(&self) -> &std::thread::Thread {
        self.inner.thread()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Waits for the worker, yielding its value or the exception it died of.
    pub fn join(self) -> Result<T, Uncaught> {
        self.inner
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
    }
}
