//! Mapping from device units onto the unit square.
//!
//! Stored coordinates are normalized with the origin at the top left, X growing right and Y growing down,
//! so a resize of whatever displays them never alters stored data.

use crate::report::RawSample;
use crate::tool::PenSample;

/// Largest raw X/Y reported by the supported models.
pub const DEFAULT_RAW_MAX: u16 = 32767;
/// Largest raw pressure reported by the supported models.
pub const DEFAULT_PRESSURE_MAX: u16 = 8191;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum Axis {
    X,
    Y,
    Pressure,
}

/// Limits of a raw axis. Reports may exceed `max`, they are clamped on mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Limits {
    pub max: u16,
}
impl Limits {
    /// Map a raw value into `[0, 1]`.
    #[must_use]
    pub fn normalize(self, raw: u16) -> f32 {
        (f32::from(raw) / f32::from(self.max)).clamp(0.0, 1.0)
    }
}

/// Size of the display the canvas is shown on, in logical pixels.
/// Only carried for renderers, mapping itself never uses it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputSize {
    pub width: f32,
    pub height: f32,
}
impl Default for OutputSize {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 900.0,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperError {
    #[error("{axis} axis has a maximum of zero")]
    ZeroRange { axis: Axis },
}

/// Pure transform from [`RawSample`]s into normalized [`PenSample`]s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    x: Limits,
    y: Limits,
    pressure: Limits,
    output: OutputSize,
}
impl CoordinateMapper {
    /// Mapper for the given raw X/Y maxima, with the default pressure maximum.
    /// # Errors
    /// [`MapperError::ZeroRange`] if either maximum is zero.
    pub fn new(raw_max_x: u16, raw_max_y: u16, output: OutputSize) -> Result<Self, MapperError> {
        Self::with_pressure_max(raw_max_x, raw_max_y, DEFAULT_PRESSURE_MAX, output)
    }
    /// # Errors
    /// [`MapperError::ZeroRange`] if any maximum is zero.
    pub fn with_pressure_max(
        raw_max_x: u16,
        raw_max_y: u16,
        pressure_max: u16,
        output: OutputSize,
    ) -> Result<Self, MapperError> {
        let limits = |max: u16, axis: Axis| {
            if max == 0 {
                Err(MapperError::ZeroRange { axis })
            } else {
                Ok(Limits { max })
            }
        };
        Ok(Self {
            x: limits(raw_max_x, Axis::X)?,
            y: limits(raw_max_y, Axis::Y)?,
            pressure: limits(pressure_max, Axis::Pressure)?,
            output,
        })
    }
    #[must_use]
    pub fn limits(&self, axis: Axis) -> Limits {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Pressure => self.pressure,
        }
    }
    #[must_use]
    pub fn output_size(&self) -> OutputSize {
        self.output
    }
    #[must_use]
    pub fn tablet_to_unit(&self, raw_x: u16, raw_y: u16) -> [f32; 2] {
        [self.x.normalize(raw_x), self.y.normalize(raw_y)]
    }
    #[must_use]
    pub fn pressure_to_unit(&self, raw_pressure: u16) -> f32 {
        self.pressure.normalize(raw_pressure)
    }
    /// Normalize a whole sample. Status flags pass through untouched.
    #[must_use]
    pub fn sample_from(&self, raw: &RawSample) -> PenSample {
        PenSample {
            position: self.tablet_to_unit(raw.x, raw.y),
            pressure: self.pressure_to_unit(raw.pressure),
            status: raw.status,
        }
    }
    /// Scale a unit-square point up to the configured output size.
    #[must_use]
    pub fn unit_to_output(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        [x * self.output.width, y * self.output.height]
    }
}
impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            x: Limits {
                max: DEFAULT_RAW_MAX,
            },
            y: Limits {
                max: DEFAULT_RAW_MAX,
            },
            pressure: Limits {
                max: DEFAULT_PRESSURE_MAX,
            },
            output: OutputSize::default(),
        }
    }
}
