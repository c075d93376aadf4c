//! # Tablets
//!
//! A tablet is the USB device the pen talks to. Over HID it shows up as several logical endpoints -
//! typically a keyboard interface for the express keys, a generic vendor interface, and the digitizer
//! that actually carries pen reports. Each endpoint is described by a [`DeviceDescriptor`], and
//! only the digitizer is interesting to us.

/// HID usage page of digitizer collections.
pub const DIGITIZER_USAGE_PAGE: u16 = 0x000D;

/// XP-Pen's USB vendor ID.
pub const XP_PEN_VENDOR: u16 = 0x28BD;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct UsbId {
    /// Vendor ID
    pub vid: u16,
    /// Product ID
    pub pid: u16,
}

/// *XP-Pen Star G640*
pub const STAR_G640: UsbId = UsbId {
    vid: XP_PEN_VENDOR,
    pid: 0x0094,
};
/// *XP-Pen 6 inch PenTablet*. Reports with the same layout as the G640.
pub const PEN_TABLET_6IN: UsbId = UsbId {
    vid: XP_PEN_VENDOR,
    pid: 0x0914,
};

/// Models this crate knows how to talk to, in the order they are tried.
pub const KNOWN_MODELS: [UsbId; 2] = [STAR_G640, PEN_TABLET_6IN];

/// One logical HID endpoint, as reported by enumeration.
///
/// Descriptors are plain data and stay valid after the endpoint is gone - opening a stale one simply fails.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub usb_id: UsbId,
    /// USB interface number, `-1` where the platform doesn't know it.
    pub interface: i32,
    pub usage_page: u16,
    pub usage: u16,
    /// Opaque, platform-specific path used to open the endpoint.
    pub path: String,
}
impl DeviceDescriptor {
    /// Whether this endpoint is a digitizer, and thus the one pen reports arrive on.
    #[must_use]
    pub fn is_digitizer(&self) -> bool {
        self.usage_page == DIGITIZER_USAGE_PAGE
    }
}
impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} if#{} usage {:04x}:{:04x} @ {}",
            self.usb_id.vid,
            self.usb_id.pid,
            self.interface,
            self.usage_page,
            self.usage,
            self.path
        )
    }
}
