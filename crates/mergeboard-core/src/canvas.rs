//! Canvas state store: the append-ordered record of all applied batches.
//!
//! The log is owned exclusively by the synchronization engine. Rendering side
//! effects are confined to the [`Surface`] the state paints into.

use crate::primitive::{Batch, Primitive};

/// Rendering surface behind the canvas state store.
///
/// `append` paints incrementally through [`Surface::paint`]; `replace` and
/// `clear` blank the surface first. Implementations live outside this crate
/// (software raster in `mergeboard-render`); [`NullSurface`] is the headless
/// stand-in.
pub trait Surface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Blank the surface.
    fn clear(&mut self);
    /// Paint a single primitive on top of existing content.
    fn paint(&mut self, primitive: &Primitive);
}

/// A surface that records nothing. Used headless and in tests.
#[derive(Debug, Clone)]
pub struct NullSurface {
    width: u32,
    height: u32,
}

impl NullSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Surface for NullSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {}

    fn paint(&mut self, _primitive: &Primitive) {}
}

/// Append-only log of applied batches plus the surface they are painted into.
pub struct CanvasState {
    batches: Vec<Batch>,
    surface: Box<dyn Surface>,
}

impl CanvasState {
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self {
            batches: Vec::new(),
            surface,
        }
    }

    /// Append a batch to the end of the log and paint only its primitives.
    pub fn append(&mut self, batch: Batch) {
        for primitive in &batch.primitives {
            self.surface.paint(primitive);
        }
        self.batches.push(batch);
    }

    /// Discard the log, install the snapshot, and repaint from scratch.
    ///
    /// A snapshot may reorder or omit primitives relative to local history,
    /// so incremental painting is not an option here.
    pub fn replace(&mut self, snapshot: Vec<Batch>) {
        self.surface.clear();
        for batch in &snapshot {
            for primitive in &batch.primitives {
                self.surface.paint(primitive);
            }
        }
        self.batches = snapshot;
    }

    /// Empty the log and blank the surface. The only non-append mutation.
    pub fn clear(&mut self) {
        self.batches.clear();
        self.surface.clear();
    }

    /// Ordered copy of the full log, suitable for a `wholeDraw` reply.
    pub fn snapshot(&self) -> Vec<Batch> {
        self.batches.clone()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{CompositeMode, SerializableColor};
    use kurbo::Point;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts paint and clear calls so incremental-vs-rebuild behavior is
    /// observable.
    struct CountingSurface {
        paints: Arc<AtomicUsize>,
        clears: Arc<AtomicUsize>,
    }

    impl Surface for CountingSurface {
        fn width(&self) -> u32 {
            800
        }
        fn height(&self) -> u32 {
            600
        }
        fn clear(&mut self) {
            self.clears.fetch_add(1, Ordering::Relaxed);
        }
        fn paint(&mut self, _primitive: &Primitive) {
            self.paints.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn counting_canvas() -> (CanvasState, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let paints = Arc::new(AtomicUsize::new(0));
        let clears = Arc::new(AtomicUsize::new(0));
        let canvas = CanvasState::new(Box::new(CountingSurface {
            paints: paints.clone(),
            clears: clears.clone(),
        }));
        (canvas, paints, clears)
    }

    fn batch(author: &str, segments: usize) -> Batch {
        let prims = (0..segments)
            .map(|i| {
                Primitive::segment(
                    Point::new(i as f64, 0.0),
                    Point::new(i as f64 + 1.0, 0.0),
                    SerializableColor::black(),
                    3.0,
                    CompositeMode::Paint,
                )
            })
            .collect();
        Batch::new(author, prims)
    }

    #[test]
    fn test_append_paints_only_the_new_batch() {
        let (mut canvas, paints, clears) = counting_canvas();
        canvas.append(batch("a", 3));
        canvas.append(batch("a", 2));

        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.primitive_count(), 5);
        // Incremental: one paint per primitive, never a full repaint.
        assert_eq!(paints.load(Ordering::Relaxed), 5);
        assert_eq!(clears.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_replace_rebuilds_from_scratch() {
        let (mut canvas, paints, clears) = counting_canvas();
        canvas.append(batch("a", 4));

        let snapshot = vec![batch("b", 1), batch("b", 2)];
        canvas.replace(snapshot.clone());

        assert_eq!(canvas.snapshot(), snapshot);
        assert_eq!(clears.load(Ordering::Relaxed), 1);
        assert_eq!(paints.load(Ordering::Relaxed), 4 + 3);
    }

    #[test]
    fn test_replace_is_idempotent() {
        let (mut canvas, _, _) = counting_canvas();
        let snapshot = vec![batch("a", 2), batch("b", 1)];

        canvas.replace(snapshot.clone());
        let first = canvas.snapshot();
        canvas.replace(snapshot);
        assert_eq!(canvas.snapshot(), first);
    }

    #[test]
    fn test_clear_empties_log_and_surface() {
        let (mut canvas, _, clears) = counting_canvas();
        canvas.append(batch("a", 2));
        canvas.clear();

        assert!(canvas.is_empty());
        assert_eq!(canvas.primitive_count(), 0);
        assert_eq!(clears.load(Ordering::Relaxed), 1);
    }
}
