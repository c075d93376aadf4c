//! # Pressure-sensitive whiteboard input for XP-Pen [tablets](tablet) ✍️
//!
//! Talks to the tablet directly over USB HID, bypassing the OS tablet stack: reports are read from the
//! digitizer endpoint, [decoded](report), [mapped](axis) onto the unit square, and assembled into
//! [strokes](stroke) on a shared [canvas]. Rendering is left to the caller, who reads
//! [snapshots](canvas::Snapshot) of the canvas whenever the [`DisplaySink`] asks for a redraw.
//!
//! To get started, create a [`Builder`].
//!
//! ## Hardware support
//! Built for XP-Pen tablets speaking the plain 8-byte pen report:
//! * *XP-Pen Star G640*
//! * *XP-Pen 6 inch PenTablet*
//!
//! Other models of the same vendor often work with [`Builder::any_product`], possibly needing a different
//! [status layout](report::StatusLayout) or [axis maxima](Builder::raw_max).
//!
//! **Note:** Button bit positions are best-effort and not verified against every model's report descriptor.
//!
//! ## Threads
//! A [`Whiteboard`] runs one worker thread while input is started, and never more. The canvas is the only
//! state it shares, behind a single mutex.

#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod assembler;
pub mod axis;
pub mod builder;
pub mod canvas;
mod input;
mod platform;
pub mod report;
pub mod stroke;
pub mod tablet;
pub mod tool;
mod util;

pub use builder::Builder;
pub use input::{DisplaySink, FatalError};
pub use platform::scripted::{FrameFeed, ScriptedTransport};
pub use platform::TransportError;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;

use builder::Settings;
use canvas::{SharedCanvas, Snapshot};
use input::InputLoop;
use platform::{CloseSignal, DeviceHandle, PlatformTransport, SelectionFailure, TransportImpl};
use tablet::DeviceDescriptor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// The system HID stack through [`hidapi`](https://crates.io/crates/hidapi).
    #[cfg(hid_backend)]
    Hid,
    /// Frames pushed by hand through a [`FrameFeed`].
    Scripted,
}

/// Errors from [`Whiteboard::connect`].
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("no device {vendor:04x}:{products:04x?} found")]
    DeviceNotFound { vendor: u16, products: Vec<u16> },
    /// Every candidate endpoint failed to open. Not retried.
    #[error("{attempts} endpoint(s) found, none could be opened")]
    OpenFailed {
        attempts: usize,
        #[source]
        last: TransportError,
    },
    #[error("enumeration failed")]
    Enumerate(#[source] TransportError),
    /// Already holding a device, [`stop_input`](Whiteboard::stop_input) it first.
    #[error("already connected")]
    AlreadyConnected,
}

/// Errors from [`Whiteboard::start_input`].
#[derive(thiserror::Error, Debug)]
pub enum StartError {
    #[error("not connected to a device")]
    NotConnected,
    #[error("input is already running")]
    AlreadyRunning,
    /// The worker thread couldn't be spawned. The connection is lost along with it.
    #[error("failed to spawn input worker")]
    Spawn(#[source] std::io::Error),
}

struct Worker {
    thread: JoinHandle<()>,
    close: CloseSignal,
    /// Never sent on. Disconnects when the worker's closure is done, panicking or not.
    done: Receiver<()>,
}

/// A tablet connection plus the canvas it draws on. This is the main entry point.
///
/// The canvas outlives any connection: it can be read, cleared, and drawn on again after reconnecting,
/// and works as a plain stroke store with no tablet at all.
pub struct Whiteboard {
    transport: PlatformTransport,
    settings: Settings,
    canvas: SharedCanvas,
    /// Connected but not yet started.
    pending: Option<Box<dyn DeviceHandle>>,
    worker: Option<Worker>,
    /// Workers that didn't stop in time. Joined on drop.
    stalled: Vec<JoinHandle<()>>,
    fatal: Option<Receiver<FatalError>>,
    /// A failure nobody took before input was restarted.
    unreported: Option<FatalError>,
}
impl Whiteboard {
    pub(crate) fn new(transport: PlatformTransport, settings: Settings, canvas: SharedCanvas) -> Self {
        Self {
            transport,
            settings,
            canvas,
            pending: None,
            worker: None,
            stalled: Vec::new(),
            fatal: None,
            unreported: None,
        }
    }
    /// Query the transport in use.
    #[must_use]
    pub fn backed(&self) -> Backend {
        match self.transport {
            #[cfg(hid_backend)]
            PlatformTransport::Hid(_) => Backend::Hid,
            PlatformTransport::Scripted(_) => Backend::Scripted,
        }
    }
    /// Every endpoint of the configured vendor, whatever the product. Useful for diagnosing a tablet that won't connect.
    /// # Errors
    /// If the transport can't enumerate.
    pub fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        self.transport.enumerate(self.settings.vendor, None)
    }
    /// Candidate endpoints, in enumeration order, each listed once.
    fn candidates(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        let vendor = self.settings.vendor;
        if self.settings.any_product {
            return self.transport.enumerate(vendor, None);
        }
        let mut found: Vec<DeviceDescriptor> = Vec::new();
        for &product in &self.settings.products {
            for descriptor in self.transport.enumerate(vendor, Some(product))? {
                if !found.iter().any(|seen| seen.path == descriptor.path) {
                    found.push(descriptor);
                }
            }
        }
        Ok(found)
    }
    /// Find and open the tablet, preferring its digitizer endpoint. Input doesn't flow until [`start_input`](Self::start_input).
    /// # Errors
    /// See [`ConnectError`]. The whiteboard stays usable as a local canvas on failure.
    pub fn connect(&mut self) -> Result<DeviceDescriptor, ConnectError> {
        if self.pending.is_some() || self.is_running() {
            return Err(ConnectError::AlreadyConnected);
        }
        self.reap();
        let candidates = self.candidates().map_err(ConnectError::Enumerate)?;
        log::debug!("{} candidate endpoint(s)", candidates.len());
        match platform::open_preferred(&mut self.transport, &candidates) {
            Ok(handle) => {
                let descriptor = handle.descriptor().clone();
                log::info!("connected to {descriptor}");
                self.pending = Some(handle);
                Ok(descriptor)
            }
            Err(SelectionFailure {
                attempts,
                last: Some(last),
            }) => Err(ConnectError::OpenFailed { attempts, last }),
            Err(SelectionFailure { last: None, .. }) => Err(ConnectError::DeviceNotFound {
                vendor: self.settings.vendor,
                products: self.settings.products.clone(),
            }),
        }
    }
    /// Start the input worker on the connected device.
    /// # Errors
    /// If not [connected](Self::connect), already running, or the thread can't be spawned.
    pub fn start_input(&mut self) -> Result<(), StartError> {
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }
        let handle = self.pending.take().ok_or(StartError::NotConnected)?;
        self.reap();
        if let Some(fatal) = self.receive_fatal() {
            if self.unreported.is_some() {
                log::warn!("restarting input, dropping unreported failure: {fatal}");
            } else {
                self.unreported = Some(fatal);
            }
        }

        let close = handle.close_signal();
        let input = InputLoop {
            handle,
            decoder: report::Decoder::new(self.settings.layout),
            mapper: self.settings.mapper,
            assembler: assembler::Assembler::new(self.settings.gate),
            canvas: self.canvas.clone(),
            sink: self.settings.sink.clone(),
            error_limit: self.settings.error_limit,
        };
        let (fatal_tx, fatal_rx) = mpsc::sync_channel(1);
        let (done_tx, done) = mpsc::sync_channel::<()>(0);
        let thread = std::thread::Builder::new()
            .name("tablet-input".to_owned())
            .spawn(move || {
                let _done = done_tx;
                if let Err(fatal) = input.run() {
                    // Nobody listening is fine.
                    let _ = fatal_tx.send(fatal);
                }
            })
            .map_err(StartError::Spawn)?;
        self.worker = Some(Worker {
            thread,
            close,
            done,
        });
        self.fatal = Some(fatal_rx);
        Ok(())
    }
    /// Close the device and stop the input worker, committing any stroke in progress.
    ///
    /// Waits up to the configured stop timeout. A worker that takes longer is left to finish on its own
    /// and joined when the whiteboard is dropped.
    pub fn stop_input(&mut self) {
        if let Some(handle) = self.pending.take() {
            log::debug!("releasing {}", handle.descriptor());
        }
        let Some(Worker {
            thread,
            close,
            done,
        }) = self.worker.take()
        else {
            return;
        };
        close.close();
        match done.recv_timeout(self.settings.stop_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "input worker still running after {:?}, leaving it behind",
                    self.settings.stop_timeout
                );
                self.stalled.push(thread);
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if thread.join().is_err() {
                    log::error!("input worker panicked");
                }
            }
        }
    }
    /// Join workers that have already exited.
    fn reap(&mut self) {
        if self
            .worker
            .as_ref()
            .is_some_and(|worker| worker.thread.is_finished())
        {
            if let Some(worker) = self.worker.take() {
                if worker.thread.join().is_err() {
                    log::error!("input worker panicked");
                }
            }
        }
        self.stalled.retain(|thread| !thread.is_finished());
    }
    /// Whether the input worker is alive. Turns false by itself after a [fatal error](Self::take_fatal).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }
    /// The error that stopped an input worker, if it stopped on its own. Each is returned once.
    ///
    /// The first failure left untaken across a restart is kept and returned first.
    pub fn take_fatal(&mut self) -> Option<FatalError> {
        self.unreported.take().or_else(|| self.receive_fatal())
    }
    fn receive_fatal(&mut self) -> Option<FatalError> {
        let fatal = self.fatal.as_ref()?.try_recv().ok()?;
        self.fatal = None;
        Some(fatal)
    }
    /// Shared handle to the canvas, for renderers on other threads.
    #[must_use]
    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.canvas.snapshot()
    }
    /// Drop every stroke. A stroke being drawn right now is dropped too, and stays gone once the pen lifts.
    pub fn clear(&self) {
        self.canvas.clear();
    }
    /// Commit the stroke being drawn, if any. Further samples of the same pen-down are ignored.
    pub fn finish_current_stroke(&self) {
        self.canvas.finish_stroke();
    }
}
impl Drop for Whiteboard {
    fn drop(&mut self) {
        self.stop_input();
        for thread in self.stalled.drain(..) {
            if thread.join().is_err() {
                log::error!("input worker panicked");
            }
        }
    }
}
