//! Local capture and batching of pointer strokes.
//!
//! Continuous pointer motion becomes discrete line segments between
//! successive sampled positions; segments collect in a pending buffer that
//! is flushed as one batch at most once per flush interval, and always on
//! pointer-up so no segment is dropped at stroke end.

use std::time::{Duration, Instant};

use kurbo::Point;

use crate::primitive::{CompositeMode, Primitive, SerializableColor};

/// Default flush interval between emitted batches.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Currently selected pen settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenSettings {
    pub color: SerializableColor,
    pub width: f64,
    pub mode: CompositeMode,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 3.0,
            mode: CompositeMode::Paint,
        }
    }
}

/// Converts pointer events into pending segments and rate-limited flushes.
#[derive(Debug)]
pub struct StrokeCapture {
    pub pen: PenSettings,
    flush_interval: Duration,
    last_pos: Option<Point>,
    pending: Vec<Primitive>,
    last_flush: Option<Instant>,
}

impl StrokeCapture {
    pub fn new(flush_interval: Duration) -> Self {
        Self {
            pen: PenSettings::default(),
            flush_interval,
            last_pos: None,
            pending: Vec::new(),
            last_flush: None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.last_pos.is_some()
    }

    /// Begin a stroke. The flush timer starts here so a short stroke stays
    /// in one batch.
    pub fn pointer_down(&mut self, pos: Point, now: Instant) {
        self.last_pos = Some(pos);
        self.last_flush = Some(now);
    }

    /// Sample a new position. Returns the pending buffer as a flush when the
    /// interval has elapsed since the last flush.
    pub fn pointer_moved(&mut self, pos: Point, now: Instant) -> Option<Vec<Primitive>> {
        let last = self.last_pos?;
        self.pending.push(Primitive::segment(
            last,
            pos,
            self.pen.color,
            self.pen.width,
            self.pen.mode,
        ));
        self.last_pos = Some(pos);

        let due = self
            .last_flush
            .is_none_or(|at| now.duration_since(at) >= self.flush_interval);
        if due {
            self.last_flush = Some(now);
            return self.take_pending();
        }
        None
    }

    /// End the stroke, forcing a flush of anything still pending regardless
    /// of the timer.
    pub fn pointer_up(&mut self, now: Instant) -> Option<Vec<Primitive>> {
        self.last_pos = None;
        self.last_flush = Some(now);
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<Vec<Primitive>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

impl Default for StrokeCapture {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_INTERVAL)
    }
}
