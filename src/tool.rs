//! # Tools
//!
//! The pen the user holds. Each input report becomes one [`PenSample`] describing where the pen is, how hard
//! it's pressed, and which of its switches are closed. Samples are consumed by the
//! [assembler](crate::assembler) and never retained.
//!
//! Whether a sample counts as "drawing" is decided by a [`DrawGate`].

use crate::report::Status;

/// Normalized state of the pen at one report.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PenSample {
    /// X, Y in `[0, 1]`, from the top left of the tablet's active area.
    pub position: [f32; 2],
    /// Tip force in `[0, 1]`.
    ///
    /// # Quirks
    /// Pressure is often non-linear, and some pens never reach full scale.
    pub pressure: f32,
    pub status: Status,
}
impl PenSample {
    /// Tip is touching the surface.
    #[must_use]
    pub fn contact(&self) -> bool {
        self.status.contact()
    }
    /// Pen is within sensing range. Observable, but never drives drawing.
    #[must_use]
    pub fn in_range(&self) -> bool {
        self.status.in_range()
    }
    #[must_use]
    pub fn primary_button(&self) -> bool {
        self.status.primary_button()
    }
    #[must_use]
    pub fn secondary_button(&self) -> bool {
        self.status.secondary_button()
    }
}

/// Predicate deciding whether a sample puts ink down.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum DrawGate {
    /// Draw whenever the tip touches the surface.
    #[default]
    Contact,
    /// Draw only while the tip touches *and* the primary barrel button is held.
    ContactAndPrimary,
}
impl DrawGate {
    #[must_use]
    pub fn is_open(self, sample: &PenSample) -> bool {
        match self {
            Self::Contact => sample.contact(),
            Self::ContactAndPrimary => sample.contact() && sample.primary_button(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: Status) -> PenSample {
        PenSample {
            status,
            ..PenSample::default()
        }
    }

    #[test]
    fn contact_gate() {
        assert!(DrawGate::Contact.is_open(&sample(Status::CONTACT)));
        assert!(!DrawGate::Contact.is_open(&sample(Status::IN_RANGE)));
        assert!(!DrawGate::Contact.is_open(&sample(Status::PRIMARY_BUTTON)));
    }

    #[test]
    fn contact_and_primary_gate() {
        let gate = DrawGate::ContactAndPrimary;
        assert!(!gate.is_open(&sample(Status::CONTACT)));
        assert!(!gate.is_open(&sample(Status::PRIMARY_BUTTON)));
        assert!(gate.is_open(&sample(Status::CONTACT | Status::PRIMARY_BUTTON)));
    }

    #[test]
    fn parses_from_kebab_case() {
        assert_eq!("contact".parse(), Ok(DrawGate::Contact));
        assert_eq!(
            "contact-and-primary".parse(),
            Ok(DrawGate::ContactAndPrimary)
        );
        assert!("pen".parse::<DrawGate>().is_err());
    }
}
