//! HID transports.
//!
//! A transport enumerates [`DeviceDescriptor`]s, opens one, and hands back a [`DeviceHandle`] doing blocking reads of
//! whole reports. Reads must return promptly once the handle's [`CloseSignal`] fires - that's how the input worker is
//! shut down.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use smallvec::SmallVec;

use crate::tablet::DeviceDescriptor;

// Conditionally include each backend...
#[cfg(hid_backend)]
pub(crate) mod hid;
pub mod scripted;

/// Largest report we ever read. Pen reports are 8-12 bytes, but a vendor interface may send up to a full packet.
pub(crate) const REPORT_BUFFER_LEN: usize = 64;

/// Shared flag used to ask a [`DeviceHandle`] to stop reading.
#[derive(Clone, Debug, Default)]
pub struct CloseSignal(Arc<AtomicBool>);
impl CloseSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Request the close. A read in progress returns [`TransportError::Closed`] within one poll interval.
    pub fn close(&self) {
        self.0.store(true, Ordering::Release);
    }
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("device enumeration failed: {0}")]
    Enumerate(String),
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },
    /// Someone else holds the endpoint.
    #[error("device busy")]
    Busy,
    /// A single read failed. Usually worth retrying.
    #[error("read failed: {0}")]
    Read(String),
    /// The handle was closed, either by us or by the transport.
    #[error("handle closed")]
    Closed,
    /// The device went away.
    #[error("device disconnected")]
    Disconnected,
    #[cfg(hid_backend)]
    #[error(transparent)]
    Hid(#[from] hidapi::HidError),
}
impl TransportError {
    /// Whether the handle is unusable after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed | Self::Disconnected)
    }
}

/// Tells an unplugged device from one that merely hiccuped, for transports whose errors don't say which.
///
/// A gone device fails every read at once instead of waiting out the poll timeout. So a run of
/// failures that each came back in well under the timeout counts as a disconnect. A slow failure or
/// any successful read breaks the run.
#[derive(Debug, Clone)]
#[cfg_attr(not(hid_backend), allow(dead_code))]
pub(crate) struct FailureStreak {
    /// Failures faster than this count towards the run.
    quick: Duration,
    run: u32,
}
#[cfg_attr(not(hid_backend), allow(dead_code))]
impl FailureStreak {
    /// Immediate failures in a row that mean the device is gone.
    pub(crate) const GONE_AFTER: u32 = 3;

    pub(crate) fn new(poll: Duration) -> Self {
        Self {
            quick: poll / 2,
            run: 0,
        }
    }
    /// Register a failed read that took `elapsed`. True once the device should be considered gone.
    pub(crate) fn failed(&mut self, elapsed: Duration) -> bool {
        if elapsed < self.quick {
            self.run = self.run.saturating_add(1);
        } else {
            self.run = 0;
        }
        self.run >= Self::GONE_AFTER
    }
    pub(crate) fn succeeded(&mut self) {
        self.run = 0;
    }
}

/// An opened endpoint.
pub trait DeviceHandle: Send {
    /// The endpoint this handle was opened from.
    fn descriptor(&self) -> &DeviceDescriptor;
    /// Block until one complete report arrives, returning its length. Reports longer than `buf` are truncated.
    /// # Errors
    /// [`TransportError::Closed`] once the [close signal](Self::close_signal) fires, others as the transport sees fit.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
    /// Signal that unblocks and ends [`read`](Self::read). The handle itself is released on drop.
    fn close_signal(&self) -> CloseSignal;
}

/// Trait that all transports implement, giving the [`Whiteboard`](crate::Whiteboard) access to the black box.
#[enum_dispatch::enum_dispatch]
pub(crate) trait TransportImpl {
    /// Every endpoint of `vendor`, restricted to `product` if given, in enumeration order.
    #[allow(clippy::missing_errors_doc)]
    fn enumerate(
        &mut self,
        vendor: u16,
        product: Option<u16>,
    ) -> Result<Vec<DeviceDescriptor>, TransportError>;
    #[allow(clippy::missing_errors_doc)]
    fn open(
        &mut self,
        descriptor: &DeviceDescriptor,
    ) -> Result<Box<dyn DeviceHandle>, TransportError>;
}

/// Static dispatch between compiled backends.
#[enum_dispatch::enum_dispatch(TransportImpl)]
pub(crate) enum PlatformTransport {
    #[cfg(hid_backend)]
    Hid(hid::Transport),
    Scripted(scripted::ScriptedTransport),
}

/// Why no candidate could be opened.
#[derive(Debug)]
pub(crate) struct SelectionFailure {
    pub attempts: usize,
    /// `None` only if there were no candidates at all.
    pub last: Option<TransportError>,
}

/// Open the best of `candidates`: digitizer endpoints first, then everything else, each group in enumeration order.
/// The first successful open wins.
pub(crate) fn open_preferred(
    transport: &mut impl TransportImpl,
    candidates: &[DeviceDescriptor],
) -> Result<Box<dyn DeviceHandle>, SelectionFailure> {
    // Tablets expose a handful of endpoints, keep these off the heap.
    let (preferred, fallback): (SmallVec<[&DeviceDescriptor; 4]>, SmallVec<[&DeviceDescriptor; 4]>) =
        candidates.iter().partition(|d| d.is_digitizer());

    let mut failure = SelectionFailure {
        attempts: 0,
        last: None,
    };
    for descriptor in preferred.into_iter().chain(fallback) {
        failure.attempts += 1;
        match transport.open(descriptor) {
            Ok(handle) => {
                log::debug!("opened {descriptor}");
                return Ok(handle);
            }
            Err(err) => {
                log::debug!("could not open {descriptor}: {err}");
                failure.last = Some(err);
            }
        }
    }
    Err(failure)
}
