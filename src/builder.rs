//! Builder-style configuration for a [`Whiteboard`].
//!
//! For the stock XP-Pen setup, `Builder::new().build_hid()` is all you need!

use std::sync::Arc;
use std::time::Duration;

use crate::axis::{CoordinateMapper, MapperError, OutputSize, DEFAULT_PRESSURE_MAX, DEFAULT_RAW_MAX};
use crate::canvas::{Canvas, SharedCanvas};
use crate::input::DisplaySink;
use crate::platform::{scripted::ScriptedTransport, PlatformTransport, TransportError};
use crate::report::StatusLayout;
use crate::stroke::WidthEnvelope;
use crate::tablet::{KNOWN_MODELS, XP_PEN_VENDOR};
use crate::tool::DrawGate;
use crate::Whiteboard;

/// Shortest accepted [poll interval](Builder::poll_interval). A zero timeout would turn blocking reads into a busy loop.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Mapper(#[from] MapperError),
    /// The transport itself failed to come up, e.g. the HID library could not initialize.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Resolved configuration, kept by the [`Whiteboard`].
pub(crate) struct Settings {
    pub vendor: u16,
    pub products: Vec<u16>,
    pub any_product: bool,
    pub gate: DrawGate,
    pub layout: StatusLayout,
    pub mapper: CoordinateMapper,
    pub poll: Duration,
    pub stop_timeout: Duration,
    pub error_limit: Option<u32>,
    pub sink: Option<Arc<dyn DisplaySink>>,
}

/// Pre-construction configuration for a [`Whiteboard`].
pub struct Builder {
    vendor: u16,
    products: Vec<u16>,
    any_product: bool,
    gate: DrawGate,
    layout: StatusLayout,
    raw_max: [u16; 2],
    pressure_max: u16,
    output: OutputSize,
    envelope: WidthEnvelope,
    poll: Duration,
    stop_timeout: Duration,
    error_limit: Option<u32>,
    sink: Option<Arc<dyn DisplaySink>>,
}
impl Default for Builder {
    fn default() -> Self {
        Self {
            vendor: XP_PEN_VENDOR,
            products: KNOWN_MODELS.iter().map(|model| model.pid).collect(),
            any_product: false,
            gate: DrawGate::default(),
            layout: StatusLayout::default(),
            raw_max: [DEFAULT_RAW_MAX; 2],
            pressure_max: DEFAULT_PRESSURE_MAX,
            output: OutputSize::default(),
            envelope: WidthEnvelope::default(),
            poll: Duration::from_millis(50),
            stop_timeout: Duration::from_millis(500),
            error_limit: Some(1000),
            sink: None,
        }
    }
}

/// # Configuration
impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// USB vendor to look for. Defaults to XP-Pen.
    #[must_use]
    pub fn vendor(mut self, vendor: u16) -> Self {
        self.vendor = vendor;
        self
    }
    /// Product IDs to look for, tried in order. Defaults to the [known models](crate::tablet::KNOWN_MODELS).
    #[must_use]
    pub fn products(mut self, products: impl IntoIterator<Item = u16>) -> Self {
        self.products = products.into_iter().collect();
        self
    }
    /// Accept any product of the vendor, ignoring [`products`](Self::products).
    #[must_use]
    pub fn any_product(mut self, any: bool) -> Self {
        self.any_product = any;
        self
    }
    #[must_use]
    pub fn gate(mut self, gate: DrawGate) -> Self {
        self.gate = gate;
        self
    }
    /// Where each flag lives in the report's status byte.
    #[must_use]
    pub fn status_layout(mut self, layout: StatusLayout) -> Self {
        self.layout = layout;
        self
    }
    /// Largest raw X and Y the tablet reports.
    #[must_use]
    pub fn raw_max(mut self, x: u16, y: u16) -> Self {
        self.raw_max = [x, y];
        self
    }
    #[must_use]
    pub fn pressure_max(mut self, max: u16) -> Self {
        self.pressure_max = max;
        self
    }
    /// Display size recorded on the canvas. Doesn't affect stored coordinates.
    #[must_use]
    pub fn output_size(mut self, output: OutputSize) -> Self {
        self.output = output;
        self
    }
    #[must_use]
    pub fn envelope(mut self, envelope: WidthEnvelope) -> Self {
        self.envelope = envelope;
        self
    }
    /// How often a blocked read wakes up to check for a stop request. At least [`MIN_POLL_INTERVAL`].
    #[must_use]
    pub fn poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll.max(MIN_POLL_INTERVAL);
        self
    }
    /// How long [`Whiteboard::stop_input`] waits for the worker before leaving it behind.
    #[must_use]
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
    /// Consecutive read errors after which the input loop gives up. `None` retries forever.
    #[must_use]
    pub fn read_error_limit(mut self, limit: Option<u32>) -> Self {
        self.error_limit = limit;
        self
    }
    #[must_use]
    pub fn sink(mut self, sink: impl DisplaySink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }
}

/// # Finishing
impl Builder {
    fn finish(self, transport: PlatformTransport) -> Result<Whiteboard, BuildError> {
        let [x, y] = self.raw_max;
        let mapper = CoordinateMapper::with_pressure_max(x, y, self.pressure_max, self.output)?;
        let canvas = Canvas::new(self.output.width, self.output.height).with_envelope(self.envelope);
        let settings = Settings {
            vendor: self.vendor,
            products: self.products,
            any_product: self.any_product,
            gate: self.gate,
            layout: self.layout,
            mapper,
            poll: self.poll,
            stop_timeout: self.stop_timeout,
            error_limit: self.error_limit,
            sink: self.sink,
        };
        Ok(Whiteboard::new(transport, settings, SharedCanvas::new(canvas)))
    }
    /// Build on the system HID stack.
    // Silly clippy, it's a self-describing err type!
    #[allow(clippy::missing_errors_doc)]
    #[cfg(hid_backend)]
    pub fn build_hid(self) -> Result<Whiteboard, BuildError> {
        let transport = crate::platform::hid::Transport::new(self.poll)?;
        self.finish(PlatformTransport::Hid(transport))
    }
    /// Build on a scripted transport, for tests and demos.
    #[allow(clippy::missing_errors_doc)]
    pub fn build_scripted(self, mut transport: ScriptedTransport) -> Result<Whiteboard, BuildError> {
        transport.set_poll_interval(self.poll);
        self.finish(PlatformTransport::Scripted(transport))
    }
}
