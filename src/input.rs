//! The read, decode, assemble cycle run by the input worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler::Assembler;
use crate::axis::CoordinateMapper;
use crate::canvas::SharedCanvas;
use crate::platform::{DeviceHandle, TransportError, REPORT_BUFFER_LEN};
use crate::report::Decoder;
use crate::tablet::DeviceDescriptor;
use crate::util::RateLimited;

/// At most one warning of each kind per this interval.
const WARN_INTERVAL: Duration = Duration::from_secs(5);
/// Pause after a failed read, so a device failing instantly can't pin a core. With the default
/// error limit that puts escalation roughly ten seconds after the failures start.
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Whoever draws the canvas. Told to redraw after every processed sample, it is expected to
/// read [`SharedCanvas::snapshot`](crate::canvas::SharedCanvas::snapshot) on its own schedule.
///
/// Called from the input worker, so it must not block for long. Posting an event to the GUI loop or
/// setting a flag is the intended use.
pub trait DisplaySink: Send + Sync {
    fn invalidate(&self);
}
impl<F: Fn() + Send + Sync> DisplaySink for F {
    fn invalidate(&self) {
        self();
    }
}

/// The input worker stopped on its own. Sent at most once per [`start_input`](crate::Whiteboard::start_input).
#[derive(thiserror::Error, Debug)]
#[error("input from {descriptor} stopped: {source}")]
pub struct FatalError {
    pub source: TransportError,
    pub descriptor: DeviceDescriptor,
}

/// Everything the worker needs, moved onto it wholesale.
pub(crate) struct InputLoop {
    pub handle: Box<dyn DeviceHandle>,
    pub decoder: Decoder,
    pub mapper: CoordinateMapper,
    pub assembler: Assembler,
    pub canvas: SharedCanvas,
    pub sink: Option<Arc<dyn DisplaySink>>,
    /// Consecutive read errors tolerated before giving up, `None` to retry forever.
    pub error_limit: Option<u32>,
}
impl InputLoop {
    fn invalidate(&self) {
        if let Some(sink) = &self.sink {
            sink.invalidate();
        }
    }
    /// Run until the handle is closed or fails for good. Any in-progress stroke is committed on the way out.
    ///
    /// Returns `Ok` only when the stop was requested through the handle's close signal.
    pub(crate) fn run(mut self) -> Result<(), FatalError> {
        let close = self.handle.close_signal();
        let mut buf = [0u8; REPORT_BUFFER_LEN];
        let mut consecutive_errors = 0u32;
        let mut read_warning = RateLimited::new(WARN_INTERVAL);
        let mut short_warning = RateLimited::new(WARN_INTERVAL);

        log::info!("reading pen reports from {}", self.handle.descriptor());
        let outcome = loop {
            let len = match self.handle.read(&mut buf) {
                Ok(len) => {
                    consecutive_errors = 0;
                    len
                }
                // Whatever the read said, we asked for it.
                Err(_) if close.is_closed() => break Ok(()),
                Err(err) if err.is_fatal() => break Err(err),
                Err(err) => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    if self
                        .error_limit
                        .is_some_and(|limit| consecutive_errors >= limit)
                    {
                        log::error!("{consecutive_errors} consecutive read errors, giving up");
                        break Err(err);
                    }
                    if let Some(suppressed) = read_warning.tick(Instant::now()) {
                        log::warn!("{err} ({suppressed} similar suppressed)");
                    }
                    std::thread::sleep(ERROR_BACKOFF);
                    continue;
                }
            };
            let raw = match self.decoder.decode(&buf[..len]) {
                Ok(raw) => raw,
                Err(err) => {
                    if let Some(suppressed) = short_warning.tick(Instant::now()) {
                        log::warn!("dropping report: {err} ({suppressed} similar suppressed)");
                    }
                    continue;
                }
            };
            let sample = self.mapper.sample_from(&raw);
            self.assembler.feed(&mut self.canvas.lock(), &sample);
            self.invalidate();
        };

        if self.assembler.close(&mut self.canvas.lock()).mutated() {
            self.invalidate();
        }
        match outcome {
            Ok(()) => {
                log::info!("input stopped");
                Ok(())
            }
            Err(source) => {
                log::error!("input from {} failed: {source}", self.handle.descriptor());
                Err(FatalError {
                    source,
                    descriptor: self.handle.descriptor().clone(),
                })
            }
        }
    }
}
