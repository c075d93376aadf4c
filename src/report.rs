//! Decoding of raw pen input reports.
//!
//! XP-Pen digitizers send a fixed 8-byte (or longer) report:
//!
//! | Offset | Width | Meaning |
//! |---|---|---|
//! | 0 | 1 | report id |
//! | 1 | 1 | status bitfield, see [`Status`] |
//! | 2..4 | 2, LE | raw X |
//! | 4..6 | 2, LE | raw Y |
//! | 6..8 | 2, LE | raw pressure |
//!
//! This is the only place in the crate that touches raw status bits.

/// Minimum number of bytes in a pen report. Anything shorter is rejected.
pub const MIN_REPORT_LEN: usize = 8;

bitflags::bitflags! {
    /// Decoded pen status. Bit positions here are *ours*, not the hardware's -
    /// see [`StatusLayout`] for where each flag lives in the raw byte.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Tip is physically touching the surface.
        const CONTACT = 1;
        /// Pen is within the sensing volume.
        const IN_RANGE = 2;
        const PRIMARY_BUTTON = 4;
        const SECONDARY_BUTTON = 8;
    }
}

impl Status {
    #[must_use]
    pub fn contact(self) -> bool {
        self.contains(Self::CONTACT)
    }
    #[must_use]
    pub fn in_range(self) -> bool {
        self.contains(Self::IN_RANGE)
    }
    #[must_use]
    pub fn primary_button(self) -> bool {
        self.contains(Self::PRIMARY_BUTTON)
    }
    #[must_use]
    pub fn secondary_button(self) -> bool {
        self.contains(Self::SECONDARY_BUTTON)
    }
}

/// Where each [`Status`] flag lives in the raw status byte, as a bit index (0 = LSB).
///
/// # Quirks
/// The button bits are the best available interpretation and have not been checked against the
/// hardware's report descriptor. Some firmware revisions may swap them, hence the remapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StatusLayout {
    pub contact: u8,
    pub in_range: u8,
    pub primary_button: u8,
    pub secondary_button: u8,
}
impl Default for StatusLayout {
    fn default() -> Self {
        Self {
            contact: 0,
            in_range: 1,
            primary_button: 2,
            secondary_button: 3,
        }
    }
}
impl StatusLayout {
    /// Layout with the two barrel buttons swapped.
    #[must_use]
    pub fn swapped_buttons(self) -> Self {
        Self {
            primary_button: self.secondary_button,
            secondary_button: self.primary_button,
            ..self
        }
    }
    /// Pick our flags out of a raw status byte. Reserved bits are ignored.
    #[must_use]
    pub fn extract(&self, raw: u8) -> Status {
        // Out-of-range bit indices never match rather than wrapping around.
        let bit = |index: u8| raw.checked_shr(u32::from(index)).is_some_and(|v| v & 1 != 0);

        let mut status = Status::empty();
        status.set(Status::CONTACT, bit(self.contact));
        status.set(Status::IN_RANGE, bit(self.in_range));
        status.set(Status::PRIMARY_BUTTON, bit(self.primary_button));
        status.set(Status::SECONDARY_BUTTON, bit(self.secondary_button));
        status
    }
}

/// One report, decoded but still in device units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawSample {
    /// Report ID byte, unused by the core but handy in logs.
    pub report_id: u8,
    pub status: Status,
    pub x: u16,
    pub y: u16,
    pub pressure: u16,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportError {
    #[error("short report: {len} bytes, need at least {MIN_REPORT_LEN}")]
    ShortReport { len: usize },
}

/// Stateless decoder from report bytes to [`RawSample`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decoder {
    layout: StatusLayout,
}
impl Decoder {
    #[must_use]
    pub fn new(layout: StatusLayout) -> Self {
        Self { layout }
    }
    #[must_use]
    pub fn layout(&self) -> StatusLayout {
        self.layout
    }
    /// Decode one report. Bytes past the first [`MIN_REPORT_LEN`] are ignored.
    ///
    /// Values are not range-checked here, the [mapper](crate::axis::CoordinateMapper) clamps.
    /// # Errors
    /// [`ReportError::ShortReport`] if fewer than [`MIN_REPORT_LEN`] bytes are given.
    pub fn decode(&self, bytes: &[u8]) -> Result<RawSample, ReportError> {
        let Some(report) = bytes.first_chunk::<MIN_REPORT_LEN>() else {
            return Err(ReportError::ShortReport { len: bytes.len() });
        };
        let &[report_id, status, x0, x1, y0, y1, p0, p1] = report;
        Ok(RawSample {
            report_id,
            status: self.layout.extract(status),
            x: u16::from_le_bytes([x0, x1]),
            y: u16::from_le_bytes([y0, y1]),
            pressure: u16::from_le_bytes([p0, p1]),
        })
    }
}

/// Decode with the default [`StatusLayout`].
/// # Errors
/// See [`Decoder::decode`].
pub fn decode(bytes: &[u8]) -> Result<RawSample, ReportError> {
    Decoder::default().decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_fields() {
        let sample = decode(&[0x07, 0x03, 0x34, 0x12, 0xFF, 0x7F, 0xFF, 0x1F]).unwrap();
        assert_eq!(sample.report_id, 0x07);
        assert_eq!(sample.x, 0x1234);
        assert_eq!(sample.y, 32767);
        assert_eq!(sample.pressure, 8191);
        assert!(sample.status.contact());
        assert!(sample.status.in_range());
        assert!(!sample.status.primary_button());
        assert!(!sample.status.secondary_button());
    }

    #[test]
    fn short_report_is_rejected() {
        assert_eq!(
            decode(&[0, 1, 0, 0, 0, 0]),
            Err(ReportError::ShortReport { len: 6 })
        );
        assert_eq!(decode(&[]), Err(ReportError::ShortReport { len: 0 }));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let short = decode(&[0, 1, 1, 0, 2, 0, 3, 0]).unwrap();
        let long = decode(&[0, 1, 1, 0, 2, 0, 3, 0, 0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn reserved_bits_are_ignored() {
        let sample = decode(&[0, 0xF0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(sample.status, Status::empty());
    }

    #[test]
    fn button_bits() {
        let sample = decode(&[0, 0b0000_0101, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(sample.status.contact() && sample.status.primary_button());
        assert!(!sample.status.secondary_button());

        let sample = decode(&[0, 0b0000_1000, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(sample.status, Status::SECONDARY_BUTTON);
    }

    #[test]
    fn remapped_layout() {
        let decoder = Decoder::new(StatusLayout::default().swapped_buttons());
        let sample = decoder.decode(&[0, 0b0000_0100, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(sample.status, Status::SECONDARY_BUTTON);

        // A bit index past the byte never matches.
        let decoder = Decoder::new(StatusLayout {
            contact: 9,
            ..StatusLayout::default()
        });
        let sample = decoder.decode(&[0, 0xFF, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(!sample.status.contact());
        assert!(sample.status.in_range());
    }
}
