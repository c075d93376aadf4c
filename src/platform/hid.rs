//! Implementation details for the native HID stack, through `hidapi`.
//!
//! Works the same on every platform hidapi supports. On Linux this is the hidraw backend,
//! so the user needs read access to `/dev/hidraw*` (usually a udev rule).

use std::ffi::CString;
use std::time::{Duration, Instant};

use hidapi::{DeviceInfo, HidApi, HidDevice};

use super::{CloseSignal, DeviceHandle, FailureStreak, TransportError, TransportImpl};
use crate::tablet::{DeviceDescriptor, UsbId};

pub(crate) struct Transport {
    api: HidApi,
    /// Upper bound on how long a read blocks before looking at its close signal.
    poll: Duration,
}
impl Transport {
    pub(crate) fn new(poll: Duration) -> Result<Self, TransportError> {
        let api = HidApi::new()?;
        Ok(Self { api, poll })
    }
}

fn descriptor_from(info: &DeviceInfo) -> DeviceDescriptor {
    DeviceDescriptor {
        usb_id: UsbId {
            vid: info.vendor_id(),
            pid: info.product_id(),
        },
        interface: info.interface_number(),
        usage_page: info.usage_page(),
        usage: info.usage(),
        path: info.path().to_string_lossy().into_owned(),
    }
}

impl TransportImpl for Transport {
    fn enumerate(
        &mut self,
        vendor: u16,
        product: Option<u16>,
    ) -> Result<Vec<DeviceDescriptor>, TransportError> {
        self.api
            .refresh_devices()
            .map_err(|err| TransportError::Enumerate(err.to_string()))?;
        Ok(self
            .api
            .device_list()
            .filter(|info| {
                info.vendor_id() == vendor && product.map_or(true, |pid| info.product_id() == pid)
            })
            .map(descriptor_from)
            .collect())
    }
    fn open(
        &mut self,
        descriptor: &DeviceDescriptor,
    ) -> Result<Box<dyn DeviceHandle>, TransportError> {
        let open_error = |reason: String| TransportError::Open {
            path: descriptor.path.clone(),
            reason,
        };
        let path =
            CString::new(descriptor.path.as_bytes()).map_err(|err| open_error(err.to_string()))?;
        let device = self
            .api
            .open_path(&path)
            .map_err(|err| open_error(err.to_string()))?;
        // Blocking mode, timeouts come from `read_timeout`.
        device
            .set_blocking_mode(true)
            .map_err(|err| open_error(err.to_string()))?;
        // A zero timeout would make every read non-blocking.
        let timeout_ms = i32::try_from(self.poll.as_millis())
            .unwrap_or(i32::MAX)
            .max(1);
        Ok(Box::new(Handle {
            descriptor: descriptor.clone(),
            device,
            close: CloseSignal::new(),
            timeout_ms,
            failures: FailureStreak::new(self.poll),
        }))
    }
}

struct Handle {
    descriptor: DeviceDescriptor,
    device: HidDevice,
    close: CloseSignal,
    timeout_ms: i32,
    failures: FailureStreak,
}
impl DeviceHandle for Handle {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        loop {
            if self.close.is_closed() {
                return Err(TransportError::Closed);
            }
            let started = Instant::now();
            match self.device.read_timeout(buf, self.timeout_ms) {
                // Zero means the timeout elapsed with nothing to read.
                Ok(0) => self.failures.succeeded(),
                Ok(len) => {
                    self.failures.succeeded();
                    return Ok(len);
                }
                // hidapi has no dedicated unplug error. Either the handle can no longer describe
                // its device, or reads keep failing without waiting.
                Err(err) => {
                    let gone = self.failures.failed(started.elapsed())
                        || self.device.get_device_info().is_err();
                    if gone {
                        log::debug!("{} looks unplugged after: {err}", self.descriptor);
                        return Err(TransportError::Disconnected);
                    }
                    return Err(err.into());
                }
            }
        }
    }
    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }
}
