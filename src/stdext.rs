use core::fmt::Write;
use core::fmt;
use std::path::Path;

pub struct LibCStderrWriter;

impl Write for LibCStderrWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            // SAFETY: the pointer and length come from a live byte slice.
            let r = unsafe { libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len()) };
            if r < 0 {
                if std::io::Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
                    continue;
                }
                return Err(fmt::Error);
            }
            if r == 0 {
                return Ok(());
            }
            bytes = &bytes[(r as usize)..];
        }
        Ok(())
    }
}

/// Writes one line to stderr with a single buffered write, so lines from
/// concurrently dying threads don't interleave mid-line.
pub fn eprint(args: fmt::Arguments<'_>) -> fmt::Result {
    let line = args.to_string();
    LibCStderrWriter.write_str(&line)
}

macro_rules! diagnostic {
    ($($tt:tt)*) => {
        // We separate out the format_args for rust-analyzer support.
        match format_args!($($tt)*) {
            args => {
                // stderr being gone leaves nowhere to report to.
                let _ = $crate::stdext::eprint(::core::format_args!(
                    "{}: {}\n",
                    $crate::stdext::program_name(),
                    args
                ));
            }
        }
    };
}

pub(crate) use diagnostic;

/// The short name of the running program, like `warnx(3)` prefixes.
pub(crate) fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from(env!("CARGO_PKG_NAME")))
}

pub(crate) fn pthread_self() -> usize {
    // SAFETY: pthread_self has no preconditions and cannot fail.
    let id = unsafe { libc::pthread_self() };
    id as usize
}
