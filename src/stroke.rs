//! Ink strokes: one continuous pen-down trace.

/// A sampled position written into a stroke. All fields in `[0, 1]`, which [`Point::new`] enforces.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    x: f32,
    y: f32,
    pressure: f32,
}
impl Point {
    /// Build a point, clamping every field into `[0, 1]`. `NaN` collapses to zero.
    #[must_use]
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            x: unit(x),
            y: unit(y),
            pressure: unit(pressure),
        }
    }
    /// Horizontal position, 0 at the left edge.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }
    /// Vertical position, 0 at the top edge.
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }
    #[must_use]
    pub fn pressure(&self) -> f32 {
        self.pressure
    }
    /// Scale up to a viewport of the given size.
    #[must_use]
    pub fn to_viewport(self, width: f32, height: f32) -> [f32; 2] {
        [self.x * width, self.y * height]
    }
}
impl From<&crate::tool::PenSample> for Point {
    /// Copies position and pressure. Flags are not stored on strokes.
    fn from(sample: &crate::tool::PenSample) -> Self {
        let [x, y] = sample.position;
        Self::new(x, y, sample.pressure)
    }
}

/// An 8-bit RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);
impl Rgba {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeError {
    #[error("stroke widths must be positive, got {min}..{max}")]
    NotPositive { min: f32, max: f32 },
    #[error("minimum stroke width {min} exceeds maximum {max}")]
    Inverted { min: f32, max: f32 },
}

/// Line width range a stroke sweeps through as pressure goes from zero to full.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthEnvelope {
    min: f32,
    max: f32,
}
impl WidthEnvelope {
    /// # Errors
    /// If either width is not a positive number, or `min > max`.
    pub fn new(min: f32, max: f32) -> Result<Self, EnvelopeError> {
        // Written so NaN fails too.
        if !(min > 0.0 && max > 0.0) {
            return Err(EnvelopeError::NotPositive { min, max });
        }
        if min > max {
            return Err(EnvelopeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }
    /// Linear interpolation between `min` and `max`, pressure clamped into `[0, 1]`.
    #[must_use]
    pub fn width_at(&self, pressure: f32) -> f32 {
        let p = if pressure.is_nan() {
            0.0
        } else {
            pressure.clamp(0.0, 1.0)
        };
        self.min + (self.max - self.min) * p
    }
}
impl Default for WidthEnvelope {
    fn default() -> Self {
        Self { min: 1.0, max: 8.0 }
    }
}

/// One continuous trace.
///
/// Never empty. Append-only until [completed](Self::is_completed), frozen afterwards -
/// a completed stroke never reverts.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    completed: bool,
    envelope: WidthEnvelope,
    color: Rgba,
}
impl Stroke {
    /// A new in-progress stroke seeded with its first point.
    #[must_use]
    pub fn new(first: Point, envelope: WidthEnvelope) -> Self {
        Self {
            points: vec![first],
            completed: false,
            envelope,
            color: Rgba::BLACK,
        }
    }
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    /// Always false for strokes built through [`Stroke::new`], kept for renderers that want to be paranoid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
    #[must_use]
    pub fn envelope(&self) -> WidthEnvelope {
        self.envelope
    }
    #[must_use]
    pub fn color(&self) -> Rgba {
        self.color
    }
    #[must_use]
    pub fn width_at(&self, pressure: f32) -> f32 {
        self.envelope.width_at(pressure)
    }
    /// Consecutive point pairs along with a line width from their average pressure.
    /// Empty for single-point strokes, which renderers draw as a dot of `width_at(points[0].pressure())`.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point, f32)> + '_ {
        self.points.windows(2).map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            (a, b, self.width_at((a.pressure + b.pressure) / 2.0))
        })
    }
    /// Returns `false` without touching anything if the stroke is already completed.
    pub(crate) fn push(&mut self, point: Point) -> bool {
        if self.completed {
            return false;
        }
        self.points.push(point);
        true
    }
    pub(crate) fn complete(&mut self) {
        self.completed = true;
    }
}
