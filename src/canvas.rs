//! The stroke store.
//!
//! A [`Canvas`] holds committed strokes in the order they were drawn plus at most one in-progress stroke.
//! It is shared between the input worker, which writes, and the GUI thread, which reads through
//! [`SharedCanvas::snapshot`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::stroke::{Point, Rgba, Stroke, WidthEnvelope};

/// Point-in-time copy of a canvas, in rendering order: committed strokes, then the in-progress one.
///
/// Later canvas mutations never show up in an already taken snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    strokes: Vec<Arc<Stroke>>,
}
impl Snapshot {
    #[must_use]
    pub fn strokes(&self) -> &[Arc<Stroke>] {
        &self.strokes
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Stroke> + '_ {
        self.strokes.iter().map(|stroke| &**stroke)
    }
}

/// Ordered strokes plus an optional in-progress one.
#[derive(Debug)]
pub struct Canvas {
    /// Completed strokes, oldest first. Shared with snapshots, which is sound since they're frozen.
    committed: Vec<Arc<Stroke>>,
    /// Invariant: never completed.
    current: Option<Stroke>,
    envelope: WidthEnvelope,
    /// Metadata only, stored coordinates are normalized.
    dimensions: [f32; 2],
    background: Rgba,
}
impl Default for Canvas {
    fn default() -> Self {
        Self::new(1200.0, 900.0)
    }
}
impl Canvas {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            committed: Vec::new(),
            current: None,
            envelope: WidthEnvelope::default(),
            dimensions: [width, height],
            background: Rgba::WHITE,
        }
    }
    /// Envelope given to strokes started from now on.
    #[must_use]
    pub fn with_envelope(mut self, envelope: WidthEnvelope) -> Self {
        self.envelope = envelope;
        self
    }
    #[must_use]
    pub fn envelope(&self) -> WidthEnvelope {
        self.envelope
    }
    #[must_use]
    pub fn dimensions(&self) -> [f32; 2] {
        self.dimensions
    }
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        self.dimensions = [width, height];
    }
    #[must_use]
    pub fn background(&self) -> Rgba {
        self.background
    }
    /// Committed strokes, oldest first.
    #[must_use]
    pub fn committed(&self) -> &[Arc<Stroke>] {
        &self.committed
    }
    #[must_use]
    pub fn current(&self) -> Option<&Stroke> {
        self.current.as_ref()
    }
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    /// Begin a new stroke at `point`. An existing in-progress stroke is finished first.
    pub fn start_stroke(&mut self, point: Point) {
        if self.current.is_some() {
            log::debug!("stroke started while another was in progress, finishing it first");
            self.finish_stroke();
        }
        self.current = Some(Stroke::new(point, self.envelope));
    }
    /// Extend the in-progress stroke. Does nothing if there is none.
    pub fn append_point(&mut self, point: Point) {
        if let Some(stroke) = &mut self.current {
            stroke.push(point);
        }
    }
    /// Commit the in-progress stroke, if any.
    pub fn finish_stroke(&mut self) {
        match self.current.take() {
            Some(mut stroke) if !stroke.is_empty() => {
                stroke.complete();
                self.committed.push(Arc::new(stroke));
            }
            // Empty or absent, nothing to keep.
            _ => (),
        }
    }
    /// Drop every stroke, committed and in progress.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.current = None;
    }
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut strokes = Vec::with_capacity(self.committed.len() + 1);
        strokes.extend(self.committed.iter().cloned());
        if let Some(current) = self.current.as_ref().filter(|s| !s.is_empty()) {
            strokes.push(Arc::new(current.clone()));
        }
        Snapshot { strokes }
    }
}

/// A [`Canvas`] behind a single mutex, cheaply cloneable across threads.
///
/// Every operation locks for a bounded amount of work. A poisoned lock is recovered rather than
/// propagated - the canvas has no invariant a panicking writer can break halfway.
#[derive(Clone, Debug, Default)]
pub struct SharedCanvas {
    inner: Arc<Mutex<Canvas>>,
}
impl SharedCanvas {
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self {
            inner: Arc::new(Mutex::new(canvas)),
        }
    }
    /// Lock for a batch of mutations. Keep the guard short-lived.
    pub fn lock(&self) -> MutexGuard<'_, Canvas> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
    /// Copy out the stroke list. The lock is released before returning.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }
    pub fn clear(&self) {
        self.lock().clear();
    }
    pub fn finish_stroke(&self) {
        self.lock().finish_stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32) -> Point {
        Point::new(x, x, x)
    }

    #[test]
    fn snapshot_orders_committed_then_current() {
        let mut canvas = Canvas::default();
        canvas.start_stroke(p(0.1));
        canvas.finish_stroke();
        canvas.start_stroke(p(0.2));
        canvas.append_point(p(0.3));

        let snapshot = canvas.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.strokes()[0].is_completed());
        assert!(!snapshot.strokes()[1].is_completed());
        assert_eq!(snapshot.strokes()[1].points(), &[p(0.2), p(0.3)]);
    }

    #[test]
    fn start_while_drawing_finishes_the_old_stroke() {
        let mut canvas = Canvas::default();
        canvas.start_stroke(p(0.1));
        canvas.start_stroke(p(0.2));
        assert_eq!(canvas.committed().len(), 1);
        assert!(canvas.is_drawing());

        // Same input twice, two strokes.
        canvas.finish_stroke();
        canvas.start_stroke(p(0.2));
        canvas.finish_stroke();
        assert_eq!(canvas.committed().len(), 3);
    }

    #[test]
    fn append_and_finish_without_current_are_noops() {
        let mut canvas = Canvas::default();
        canvas.append_point(p(0.5));
        let before = canvas.snapshot();
        canvas.finish_stroke();
        assert_eq!(canvas.snapshot(), before);
        assert!(before.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut canvas = Canvas::default();
        canvas.start_stroke(p(0.1));
        canvas.finish_stroke();
        canvas.start_stroke(p(0.2));
        canvas.clear();
        assert!(canvas.snapshot().is_empty());
        assert!(!canvas.is_drawing());
    }

    #[test]
    fn snapshots_are_detached() {
        let shared = SharedCanvas::default();
        shared.lock().start_stroke(p(0.1));
        let first = shared.snapshot();
        let second = shared.snapshot();
        assert_eq!(first, second);

        shared.lock().append_point(p(0.2));
        shared.finish_stroke();
        assert_eq!(first.strokes()[0].len(), 1);
        assert!(!first.strokes()[0].is_completed());
        assert_eq!(shared.snapshot().strokes()[0].len(), 2);
    }

    #[test]
    fn out_of_range_input_is_stored_clamped() {
        let shared = SharedCanvas::default();
        shared.lock().start_stroke(Point::new(2.5, -1.0, f32::NAN));
        shared.lock().append_point(Point::new(f32::NEG_INFINITY, 0.5, 40.0));
        shared.finish_stroke();

        let snapshot = shared.snapshot();
        let points = snapshot.strokes()[0].points();
        assert_eq!(points.len(), 2);
        for point in points {
            for v in [point.x(), point.y(), point.pressure()] {
                assert!((0.0..=1.0).contains(&v), "{point:?}");
            }
        }
        assert_eq!(points[0], Point::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn strokes_use_the_canvas_envelope() {
        let envelope = WidthEnvelope::new(2.0, 4.0).unwrap();
        let mut canvas = Canvas::new(640.0, 480.0).with_envelope(envelope);
        canvas.start_stroke(p(0.5));
        canvas.finish_stroke();
        assert_eq!(canvas.committed()[0].width_at(1.0), 4.0);
        assert_eq!(canvas.dimensions(), [640.0, 480.0]);
        assert_eq!(canvas.background(), Rgba::WHITE);
    }

    #[test]
    fn shared_canvas_across_threads() {
        let shared = SharedCanvas::default();
        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..50u8 {
                    let mut canvas = shared.lock();
                    canvas.start_stroke(p(f32::from(i) / 50.0));
                    canvas.finish_stroke();
                }
            })
        };
        for _ in 0..50 {
            let snapshot = shared.snapshot();
            assert!(snapshot.iter().all(Stroke::is_completed));
        }
        writer.join().unwrap();
        assert_eq!(shared.snapshot().len(), 50);
    }
}
