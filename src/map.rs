// SPDX: CC0-1.0

//! Affine transform between a [`Domain`] and a padded pixel viewport.
//!
//! Pixel y grows downward, math y grows upward. The mapper does not validate
//! its inputs: a domain with `start >= end` or a viewport no larger than twice
//! the padding produces meaningless (possibly non-finite) coordinates.

use crate::{span, Domain, Number, Point};

/// Padding between the viewport edge and the drawable area, in pixels.
pub const DEFAULT_PADDING: Number = 30.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Mapper {
    pub domain: Domain,
    pub width: Number,
    pub height: Number,
    pub padding: Number,
}

impl Mapper {
    pub const fn new(domain: Domain, width: Number, height: Number, padding: Number) -> Self {
        Self {
            domain,
            width,
            height,
            padding,
        }
    }

    pub fn inner_width(&self) -> Number {
        self.width - 2.0 * self.padding
    }

    pub fn inner_height(&self) -> Number {
        self.height - 2.0 * self.padding
    }

    pub fn map_x(&self, x: Number) -> Number {
        let x_range = &self.domain.x;
        self.padding + (x - x_range.start) / span(x_range) * self.inner_width()
    }

    pub fn map_y(&self, y: Number) -> Number {
        let y_range = &self.domain.y;
        self.height - self.padding - (y - y_range.start) / span(y_range) * self.inner_height()
    }

    pub fn map(&self, p: Point<Number>) -> Point<Number> {
        Point::new(self.map_x(p.x), self.map_y(p.y))
    }

    pub fn unmap_x(&self, px: Number) -> Number {
        let x_range = &self.domain.x;
        x_range.start + (px - self.padding) / self.inner_width() * span(x_range)
    }

    pub fn unmap_y(&self, py: Number) -> Number {
        let y_range = &self.domain.y;
        y_range.start + (self.height - self.padding - py) / self.inner_height() * span(y_range)
    }

    /// Pixels per math unit along each axis.
    pub fn scale(&self) -> Point<Number> {
        Point::new(
            self.inner_width() / span(&self.domain.x),
            self.inner_height() / span(&self.domain.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> Mapper {
        Mapper::new(Domain::new(-5.0..5.0, -2.0..8.0), 400.0, 300.0, 30.0)
    }

    #[test]
    fn origin_is_drawable_midpoint() {
        let m = mapper();
        assert!((m.map_x(0.0) - 200.0).abs() < 1e-9);
        assert!((m.unmap_x(200.0)).abs() < 1e-9);
        assert!((m.map_x(-5.0) - 30.0).abs() < 1e-9);
        assert!((m.map_x(5.0) - 370.0).abs() < 1e-9);
    }

    #[test]
    fn x_roundtrip() {
        let m = mapper();
        for i in 0..=100 {
            let x = -5.0 + Number::from(i) * 0.1;
            assert!((m.unmap_x(m.map_x(x)) - x).abs() < 1e-9);
        }
    }

    #[test]
    fn y_is_inverted() {
        let m = mapper();
        assert!(m.map_y(-2.0) > m.map_y(8.0));
        assert!((m.map_y(-2.0) - 270.0).abs() < 1e-9);
        assert!((m.map_y(8.0) - 30.0).abs() < 1e-9);
        assert!((m.unmap_y(m.map_y(3.5)) - 3.5).abs() < 1e-9);
    }
}
