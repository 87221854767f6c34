//! Cooperative shutdown.
//!
//! A [`Shutdown`] token is shared by the sampling loop and the display
//! thread. Every sleep in the runtime goes through [`Shutdown::sleep`], which
//! wakes in short slices so a trip is observed within one slice.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound on how long a sleeping thread can miss a shutdown request.
pub const SLEEP_SLICE: Duration = Duration::from_millis(50);

static SIGNALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signum: libc::c_int) {
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    watch_signals: bool,
}

impl Shutdown {
    /// Token tripped only through [`Shutdown::trigger`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that is also tripped by SIGINT or SIGTERM.
    pub fn with_signals() -> io::Result<Self> {
        install_signal_handlers()?;
        Ok(Shutdown {
            flag: Arc::new(AtomicBool::new(false)),
            watch_signals: true,
        })
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || (self.watch_signals && signal_received())
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// Returns `false` if the sleep was cut short (or never started) because
    /// of shutdown.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}

/// Whether SIGINT or SIGTERM has been delivered since startup.
pub fn signal_received() -> bool {
    SIGNALLED.load(Ordering::SeqCst)
}

fn install_signal_handlers() -> io::Result<()> {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signum in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
        let previous = unsafe { libc::signal(signum, handler) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_completes_when_not_triggered() {
        let shutdown = Shutdown::new();
        let start = Instant::now();
        assert!(shutdown.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_zero_sleep_returns_immediately() {
        assert!(Shutdown::new().sleep(Duration::ZERO));
    }

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        clone.trigger();
        assert!(shutdown.is_triggered());
        assert!(!shutdown.sleep(Duration::from_secs(10)));
    }

    #[test]
    fn test_trigger_wakes_sleeper() {
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            remote.trigger();
        });
        let start = Instant::now();
        assert!(!shutdown.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(2));
        waker.join().unwrap();
    }
}
