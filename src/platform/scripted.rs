//! In-memory transport fed from the test (or demo) side.
//!
//! [`ScriptedTransport`] enumerates a fixed list of descriptors and hands out a single handle whose reads pull from
//! a [`FrameFeed`]. Frames, read errors and disconnects are delivered in the order they were pushed.

use std::sync::{
    mpsc::{self, Receiver, RecvTimeoutError, Sender},
    Arc, Mutex,
};
use std::time::Duration;

use super::{CloseSignal, DeviceHandle, TransportError, TransportImpl};
use crate::tablet::DeviceDescriptor;

enum Frame {
    Report(Vec<u8>),
    Fail(String),
    Disconnect,
}

type Attempts = Arc<Mutex<Vec<String>>>;

fn record(attempts: &Attempts, path: &str) {
    attempts
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(path.to_owned());
}

/// A transport that replays frames pushed through its [`FrameFeed`].
pub struct ScriptedTransport {
    descriptors: Vec<DeviceDescriptor>,
    refused: Vec<String>,
    /// Taken by the first successful open.
    frames: Option<Receiver<Frame>>,
    attempts: Attempts,
    poll: Duration,
}
impl ScriptedTransport {
    /// A transport enumerating `descriptors` in the given order, along with the feed that drives its handle.
    #[must_use]
    pub fn new(descriptors: Vec<DeviceDescriptor>) -> (Self, FrameFeed) {
        let (sender, receiver) = mpsc::channel();
        let attempts = Attempts::default();
        (
            Self {
                descriptors,
                refused: Vec::new(),
                frames: Some(receiver),
                attempts: attempts.clone(),
                poll: Duration::from_millis(10),
            },
            FrameFeed { sender, attempts },
        )
    }
    /// Fail every open of the endpoint at `path`.
    #[must_use]
    pub fn refuse(mut self, path: impl Into<String>) -> Self {
        self.refused.push(path.into());
        self
    }
    /// How long a read waits for a frame before re-checking its close signal.
    pub(crate) fn set_poll_interval(&mut self, poll: Duration) {
        self.poll = poll;
    }
}
impl TransportImpl for ScriptedTransport {
    fn enumerate(
        &mut self,
        vendor: u16,
        product: Option<u16>,
    ) -> Result<Vec<DeviceDescriptor>, TransportError> {
        Ok(self
            .descriptors
            .iter()
            .filter(|d| d.usb_id.vid == vendor && product.map_or(true, |pid| d.usb_id.pid == pid))
            .cloned()
            .collect())
    }
    fn open(
        &mut self,
        descriptor: &DeviceDescriptor,
    ) -> Result<Box<dyn DeviceHandle>, TransportError> {
        record(&self.attempts, &descriptor.path);
        if self.refused.contains(&descriptor.path) {
            return Err(TransportError::Open {
                path: descriptor.path.clone(),
                reason: "refused by script".to_owned(),
            });
        }
        let frames = self.frames.take().ok_or(TransportError::Busy)?;
        Ok(Box::new(ScriptedHandle {
            descriptor: descriptor.clone(),
            frames,
            close: CloseSignal::new(),
            poll: self.poll,
        }))
    }
}

/// Producer side of a [`ScriptedTransport`].
pub struct FrameFeed {
    sender: Sender<Frame>,
    attempts: Attempts,
}
impl FrameFeed {
    /// Queue one raw report. Returns `false` if the handle has already been dropped.
    pub fn push(&self, report: impl Into<Vec<u8>>) -> bool {
        self.sender.send(Frame::Report(report.into())).is_ok()
    }
    /// Queue a transient read failure.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.sender.send(Frame::Fail(reason.into())).is_ok()
    }
    /// Queue a disconnect. Reads after it are fatal.
    pub fn disconnect(&self) -> bool {
        self.sender.send(Frame::Disconnect).is_ok()
    }
    /// End the script. Once the queue drains, reads report the handle closed.
    pub fn finish(self) {}
    /// Paths passed to `open`, successful or not, in call order.
    #[must_use]
    pub fn open_attempts(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

struct ScriptedHandle {
    descriptor: DeviceDescriptor,
    frames: Receiver<Frame>,
    close: CloseSignal,
    poll: Duration,
}
impl DeviceHandle for ScriptedHandle {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        loop {
            if self.close.is_closed() {
                return Err(TransportError::Closed);
            }
            match self.frames.recv_timeout(self.poll) {
                Ok(Frame::Report(report)) => {
                    let len = report.len().min(buf.len());
                    buf[..len].copy_from_slice(&report[..len]);
                    return Ok(len);
                }
                Ok(Frame::Fail(reason)) => return Err(TransportError::Read(reason)),
                Ok(Frame::Disconnect) => return Err(TransportError::Disconnected),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Closed),
            }
        }
    }
    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tablet::{PEN_TABLET_6IN, STAR_G640};

    fn descriptor(path: &str, usb_id: crate::tablet::UsbId) -> DeviceDescriptor {
        DeviceDescriptor {
            usb_id,
            interface: 2,
            usage_page: crate::tablet::DIGITIZER_USAGE_PAGE,
            usage: 2,
            path: path.to_owned(),
        }
    }

    #[test]
    fn enumerate_filters_by_product() {
        let (mut transport, _feed) = ScriptedTransport::new(vec![
            descriptor("g640", STAR_G640),
            descriptor("six", PEN_TABLET_6IN),
        ]);
        let found = transport
            .enumerate(STAR_G640.vid, Some(PEN_TABLET_6IN.pid))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "six");
        assert_eq!(transport.enumerate(STAR_G640.vid, None).unwrap().len(), 2);
        assert!(transport.enumerate(0x1234, None).unwrap().is_empty());
    }

    #[test]
    fn reads_follow_the_script() {
        let (mut transport, feed) = ScriptedTransport::new(vec![descriptor("g640", STAR_G640)]);
        let mut handle = transport.open(&descriptor("g640", STAR_G640)).unwrap();
        feed.push([1u8, 2, 3]);
        feed.fail("glitch");
        feed.disconnect();

        let mut buf = [0u8; 2];
        assert_eq!(handle.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert!(matches!(handle.read(&mut buf), Err(TransportError::Read(_))));
        assert!(matches!(
            handle.read(&mut buf),
            Err(TransportError::Disconnected)
        ));
        feed.finish();
        assert!(matches!(handle.read(&mut buf), Err(TransportError::Closed)));
    }

    #[test]
    fn close_signal_unblocks_a_read() {
        let (mut transport, _feed) = ScriptedTransport::new(vec![descriptor("g640", STAR_G640)]);
        let mut handle = transport.open(&descriptor("g640", STAR_G640)).unwrap();
        let close = handle.close_signal();
        let reader = std::thread::spawn(move || handle.read(&mut [0u8; 8]));
        close.close();
        assert!(matches!(
            reader.join().unwrap(),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn second_open_is_busy() {
        let (mut transport, feed) = ScriptedTransport::new(vec![descriptor("g640", STAR_G640)]);
        let _first = transport.open(&descriptor("g640", STAR_G640)).unwrap();
        assert!(matches!(
            transport.open(&descriptor("g640", STAR_G640)),
            Err(TransportError::Busy)
        ));
        assert_eq!(feed.open_attempts(), ["g640", "g640"]);
    }
}
