//! MergeBoard Render Library
//!
//! Software raster implementation of the core [`Surface`] trait. Segments
//! are stamped as a round brush into an RGBA buffer; erase segments punch
//! transparency (destination-out). Markup primitives are counted but not
//! rasterized here — painting arbitrary vector markup is a vector-backend
//! concern.

use image::{Rgba, RgbaImage};
use kurbo::Point;
use log::debug;

use mergeboard_core::{CompositeMode, Primitive, PrimitiveShape, Segment, Surface};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// CPU raster surface over an RGBA pixel buffer.
pub struct RasterSurface {
    image: RgbaImage,
    markup_count: usize,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, TRANSPARENT),
            markup_count: 0,
        }
    }

    /// Pixel at (x, y) as RGBA8.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Markup primitives seen since the last clear.
    pub fn markup_count(&self) -> usize {
        self.markup_count
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    fn stamp_segment(&mut self, segment: &Segment) {
        let pixel = match segment.mode {
            CompositeMode::Paint => Rgba([
                segment.color.r,
                segment.color.g,
                segment.color.b,
                segment.color.a,
            ]),
            CompositeMode::Erase => TRANSPARENT,
        };
        let radius = (segment.width / 2.0).max(0.5);

        // Walk the segment at sub-pixel steps and stamp a filled disc at
        // each sample so joins stay round and gapless.
        let length = segment.length();
        let steps = (length / 0.5).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let center = Point::new(
                segment.start.x + (segment.end.x - segment.start.x) * t,
                segment.start.y + (segment.end.y - segment.start.y) * t,
            );
            self.stamp_disc(center, radius, pixel);
        }
    }

    fn stamp_disc(&mut self, center: Point, radius: f64, pixel: Rgba<u8>) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        let min_x = ((center.x - radius).floor() as i64).max(0);
        let max_x = ((center.x + radius).ceil() as i64).min(w - 1);
        let min_y = ((center.y - radius).floor() as i64).max(0);
        let max_y = ((center.y + radius).ceil() as i64).min(h - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= radius * radius {
                    self.image.put_pixel(x as u32, y as u32, pixel);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
        self.markup_count = 0;
    }

    fn paint(&mut self, primitive: &Primitive) {
        match &primitive.shape {
            PrimitiveShape::Segment(segment) => self.stamp_segment(segment),
            PrimitiveShape::Markup { svg } => {
                debug!("skipping raster of markup fragment ({} bytes)", svg.len());
                self.markup_count += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergeboard_core::{Batch, SerializableColor};

    fn red_segment(y: f64) -> Primitive {
        Primitive::segment(
            Point::new(2.0, y),
            Point::new(20.0, y),
            SerializableColor::red(),
            4.0,
            CompositeMode::Paint,
        )
    }

    #[test]
    fn test_segment_paints_pixels_along_the_path() {
        let mut surface = RasterSurface::new(32, 32);
        surface.paint(&red_segment(10.0));

        for x in [3u32, 10, 18] {
            assert_eq!(surface.pixel(x, 10), [255, 0, 0, 255]);
        }
        // Far from the stroke stays transparent.
        assert_eq!(surface.pixel(10, 25), [0, 0, 0, 0]);
    }

    #[test]
    fn test_erase_is_destination_out() {
        let mut surface = RasterSurface::new(32, 32);
        surface.paint(&red_segment(10.0));
        surface.paint(&Primitive::segment(
            Point::new(2.0, 10.0),
            Point::new(20.0, 10.0),
            SerializableColor::black(),
            4.0,
            CompositeMode::Erase,
        ));

        assert_eq!(surface.pixel(10, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn test_clear_blanks_everything() {
        let mut surface = RasterSurface::new(16, 16);
        surface.paint(&red_segment(5.0));
        surface.paint(&Primitive::markup("<circle r=\"3\"/>"));
        surface.clear();

        assert_eq!(surface.pixel(5, 5), [0, 0, 0, 0]);
        assert_eq!(surface.markup_count(), 0);
    }

    #[test]
    fn test_snapshot_replace_renders_identically() {
        // Applying the same snapshot twice must produce identical pixels:
        // the visual half of snapshot idempotence.
        let snapshot = vec![
            Batch::new("a", vec![red_segment(4.0)]),
            Batch::new("b", vec![red_segment(12.0)]),
        ];

        // Once.
        let mut once = RasterSurface::new(32, 32);
        for batch in &snapshot {
            for prim in &batch.primitives {
                once.paint(prim);
            }
        }

        // Twice, with the rebuild a replace performs in between.
        let mut twice = RasterSurface::new(32, 32);
        for _ in 0..2 {
            twice.clear();
            for batch in &snapshot {
                for prim in &batch.primitives {
                    twice.paint(prim);
                }
            }
        }
        assert_eq!(once.image().as_raw(), twice.image().as_raw());
    }

    #[test]
    fn test_markup_is_counted_not_rasterized() {
        let mut surface = RasterSurface::new(16, 16);
        surface.paint(&Primitive::markup("<rect width=\"4\" height=\"4\"/>"));
        assert_eq!(surface.markup_count(), 1);
        assert_eq!(surface.pixel(2, 2), [0, 0, 0, 0]);
    }
}
