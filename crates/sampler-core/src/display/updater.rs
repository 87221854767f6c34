//! Periodic display refresh on its own thread.
//!
//! The updater only holds the smoothing-window lock long enough to compute
//! the mean; display I/O happens after the lock is released, so a slow panel
//! never delays acquisition.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::{DisplayError, DisplayLayout, DisplayPort};
use crate::sampler::SmoothingWindow;
use crate::shutdown::Shutdown;

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The smoothed value was shown (after clamping).
    Rendered { value: f64, text: String },
    /// Not enough samples in the window yet.
    NotReady { samples: usize, needed: usize },
}

pub struct DisplayUpdater<D = Box<dyn DisplayPort>> {
    display: D,
    layout: DisplayLayout,
    window: SmoothingWindow,
}

impl<D: DisplayPort> DisplayUpdater<D> {
    pub fn new(display: D, layout: DisplayLayout, window: SmoothingWindow) -> Self {
        DisplayUpdater {
            display,
            layout,
            window,
        }
    }

    /// Draw the static labels.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.layout.draw_static(&mut self.display)
    }

    /// Render the current smoothed value if the window is ready.
    pub fn refresh(&mut self) -> Result<RenderOutcome, DisplayError> {
        let (mean, samples, needed) = {
            let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
            (window.ready_mean(), window.len(), window.min_samples())
        };

        match mean {
            None => Ok(RenderOutcome::NotReady { samples, needed }),
            Some(value) => {
                let text = self.layout.render_value(&mut self.display, value)?;
                Ok(RenderOutcome::Rendered { value, text })
            }
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run [`refresh`](Self::refresh) every `period` until shutdown.
    pub fn spawn(mut self, period: Duration, shutdown: Shutdown) -> io::Result<DisplayHandle>
    where
        D: 'static,
    {
        let thread = thread::Builder::new()
            .name("sampler-display".to_string())
            .spawn(move || {
                let mut renders = 0u64;
                loop {
                    match self.refresh() {
                        Ok(RenderOutcome::Rendered { text, .. }) => {
                            renders += 1;
                            trace!(value = %text, "display refreshed");
                        }
                        Ok(RenderOutcome::NotReady { samples, needed }) => {
                            trace!(samples, needed, "smoothing window not ready");
                        }
                        Err(e) => warn!(error = %e, "display refresh failed"),
                    }
                    if !shutdown.sleep(period) {
                        break;
                    }
                }
                debug!(renders, "display updater stopped");
                renders
            })?;
        Ok(DisplayHandle {
            thread: Some(thread),
        })
    }
}

/// Handle to the running updater thread.
pub struct DisplayHandle {
    thread: Option<JoinHandle<u64>>,
}

impl DisplayHandle {
    /// Wait for the thread to exit (after shutdown was triggered) and return
    /// the number of renders it made.
    pub fn join(mut self) -> u64 {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(renders)) => renders,
            Some(Err(_)) => {
                warn!("display updater thread panicked");
                0
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::CharGrid;
    use crate::sampler::smoothing_window;

    #[derive(Default)]
    struct GridDisplay {
        grid: CharGrid,
        flushes: usize,
    }

    impl DisplayPort for GridDisplay {
        fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), DisplayError> {
            self.grid.write_at(row, col, text)
        }

        fn flush(&mut self) -> Result<(), DisplayError> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_not_ready_until_window_full() {
        let window = smoothing_window(3);
        let mut updater =
            DisplayUpdater::new(GridDisplay::default(), DisplayLayout::default(), window.clone());
        updater.init().unwrap();

        window.lock().unwrap().push(5.0);
        window.lock().unwrap().push(7.0);
        assert_eq!(
            updater.refresh().unwrap(),
            RenderOutcome::NotReady {
                samples: 2,
                needed: 3
            }
        );
        assert_eq!(updater.display().flushes, 1);

        window.lock().unwrap().push(9.0);
        assert_eq!(
            updater.refresh().unwrap(),
            RenderOutcome::Rendered {
                value: 7.0,
                text: "7.00".to_string()
            }
        );
        assert_eq!(
            updater.display().grid.row(2).unwrap().trim_end(),
            "P(g) kg/cm2: 7.00"
        );
    }

    #[test]
    fn test_negative_mean_rendered_as_zero() {
        let window = smoothing_window(2);
        window.lock().unwrap().push(-4.0);
        window.lock().unwrap().push(-2.0);
        let mut updater =
            DisplayUpdater::new(GridDisplay::default(), DisplayLayout::default(), window);
        match updater.refresh().unwrap() {
            RenderOutcome::Rendered { value, text } => {
                assert_eq!(value, -3.0);
                assert_eq!(text, "0.00");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_thread_stops_on_shutdown() {
        let window = smoothing_window(1);
        window.lock().unwrap().push(1.0);
        let shutdown = Shutdown::new();
        let handle = DisplayUpdater::new(GridDisplay::default(), DisplayLayout::default(), window)
            .spawn(Duration::from_millis(10), shutdown.clone())
            .unwrap();
        thread::sleep(Duration::from_millis(80));
        shutdown.trigger();
        assert!(handle.join() >= 1);
    }
}
