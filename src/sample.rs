// SPDX: CC0-1.0

//! Turns a function into polyline segments in pixel space.

use crate::{
    expr::{Bindings, Expr},
    map::Mapper,
    span, Number, Point,
};

/// Sampling step of plotted functions, as a multiple of one pixel's width in
/// math units.
pub const PLOT_STEP_FACTOR: Number = 0.5;

/// Coarser step used for function items of geometry scenes.
pub const GEOMETRY_STEP_FACTOR: Number = 2.0;

/// A run of consecutive finite, on-canvas samples.
pub type Segment = Vec<Point<Number>>;

/// Samples `expr` across the mapper's x range.
///
/// A sample that is not finite, or that lands more than one viewport height
/// above or below the viewport, ends the current segment. Single-point
/// segments are dropped since they draw nothing.
pub fn sample(
    expr: &Expr,
    bindings: &mut Bindings,
    mapper: &Mapper,
    step_factor: Number,
) -> Vec<Segment> {
    let x_range = &mapper.domain.x;
    let step = span(x_range) / mapper.width * step_factor;
    if !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let steps = (span(x_range) / step).ceil() as usize;

    let mut segments = Vec::new();
    let mut current: Segment = Vec::new();
    let mut flush = |current: &mut Segment| {
        if current.len() > 1 {
            segments.push(core::mem::take(current));
        } else {
            current.clear();
        }
    };

    for i in 0..=steps {
        let x = if i == steps {
            x_range.end
        } else {
            x_range.start + step * i as Number
        };
        let y = expr.eval(bindings, x);
        let py = mapper.map_y(y);
        if !y.is_finite() || py < -mapper.height || py > 2.0 * mapper.height {
            flush(&mut current);
            continue;
        }
        current.push(Point::new(mapper.map_x(x), py));
    }
    flush(&mut current);

    log::trace!(
        "sampled {:?} into {} segment(s)",
        expr.src(),
        segments.len()
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Domain, Params};

    fn run(src: &str, domain: Domain) -> (Mapper, Vec<Segment>) {
        let mapper = Mapper::new(domain, 400.0, 300.0, 30.0);
        let segments = sample(
            &Expr::compile(src),
            &mut Bindings::new(&Params::new()),
            &mapper,
            PLOT_STEP_FACTOR,
        );
        (mapper, segments)
    }

    #[test]
    fn continuous_function_is_one_segment() {
        let (mapper, segments) = run("x / 2", Domain::default());
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert!((seg[0].x - mapper.map_x(-5.0)).abs() < 1e-9);
        assert!((seg[seg.len() - 1].x - mapper.map_x(5.0)).abs() < 1e-9);
        // two samples per pixel
        assert!(seg.len() >= 800);
    }

    #[test]
    fn asymptote_breaks_the_curve() {
        let (mapper, segments) = run("1/x", Domain::new(-4.0..4.0, -5.0..5.0));
        assert!(segments.len() >= 2);
        let zero = mapper.map_x(0.0);
        for seg in &segments {
            let left = seg.iter().all(|p| p.x < zero);
            let right = seg.iter().all(|p| p.x > zero);
            assert!(left || right, "segment crosses x = 0");
        }
    }

    #[test]
    fn undefined_regions_are_gaps() {
        let (mapper, segments) = run("Math.sqrt(x)", Domain::default());
        assert_eq!(segments.len(), 1);
        assert!(segments[0][0].x >= mapper.map_x(0.0) - 1e-9);
    }

    #[test]
    fn malformed_expression_draws_nothing() {
        let (_, segments) = run("x +", Domain::default());
        assert!(segments.is_empty());
    }
}
