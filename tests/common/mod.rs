#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use xpboard::tablet::{DeviceDescriptor, UsbId, DIGITIZER_USAGE_PAGE, STAR_G640};
use xpboard::{Builder, FrameFeed, ScriptedTransport, Whiteboard};

pub const CONTACT: u8 = 0x01;
pub const IN_RANGE: u8 = 0x02;

pub fn endpoint(path: &str, usb_id: UsbId, usage_page: u16) -> DeviceDescriptor {
    DeviceDescriptor {
        usb_id,
        interface: 0,
        usage_page,
        usage: 1,
        path: path.to_owned(),
    }
}

pub fn pen(path: &str) -> DeviceDescriptor {
    endpoint(path, STAR_G640, DIGITIZER_USAGE_PAGE)
}

pub fn report(status: u8, x: u16, y: u16, pressure: u16) -> Vec<u8> {
    let mut report = vec![0, status];
    report.extend(x.to_le_bytes());
    report.extend(y.to_le_bytes());
    report.extend(pressure.to_le_bytes());
    report
}

/// Spin until `done` or a generous deadline.
pub fn wait_for(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// A started whiteboard on a single scripted pen, and a count of redraw requests.
pub struct Session {
    pub board: Whiteboard,
    pub feed: FrameFeed,
    pub redraws: Arc<AtomicUsize>,
}
impl Session {
    pub fn start(builder: Builder) -> Self {
        let (transport, feed) = ScriptedTransport::new(vec![pen("pen")]);
        let redraws = Arc::new(AtomicUsize::new(0));
        let mut board = builder
            .poll_interval(Duration::from_millis(5))
            .sink({
                let redraws = redraws.clone();
                move || {
                    redraws.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build_scripted(transport)
            .unwrap();
        board.connect().unwrap();
        board.start_input().unwrap();
        Self {
            board,
            feed,
            redraws,
        }
    }
    pub fn redraws(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }
    /// Push reports and wait until the worker has processed `expected` more of them.
    pub fn send(&self, reports: &[Vec<u8>], expected: usize) {
        let target = self.redraws() + expected;
        for report in reports {
            self.feed.push(report.clone());
        }
        wait_for(|| self.redraws() >= target);
    }
}
