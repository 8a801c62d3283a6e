// SPDX: CC0-1.0

//! Planar geometry scenes: typed primitives mapped to drawable shapes.
//!
//! Items that miss a field their kind needs are skipped one by one, the rest
//! of the scene still renders.

use crate::{
    config::{to_domain, ConfigError, GeometryConfig},
    expr::{Bindings, Expr},
    map::{Mapper, DEFAULT_PADDING},
    sample::{self, Segment, GEOMETRY_STEP_FACTOR},
    span, Domain, Number, Params, Point,
};
use core::ops::Range;
use serde::{Deserialize, Serialize};

/// Fraction of the content's extent added on each side when auto-fitting.
pub const FIT_MARGIN: Number = 0.2;

/// Smallest extent an auto-fitted axis may have, before the margin.
pub const FIT_MIN_SPAN: Number = 2.0;

pub const DEFAULT_ITEM_COLOR: &str = "#1f2937";
pub const POINT_RADIUS_PX: Number = 4.0;
pub const ARROW_HEAD_PX: Number = 10.0;

pub type Coord = [Number; 2];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

/// One primitive, tagged by `type` in JSON.
///
/// Every coordinate is optional so an incomplete item still deserializes and
/// can be skipped on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometryItem {
    Point {
        #[serde(default)]
        x: Option<Number>,
        #[serde(default)]
        y: Option<Number>,
        #[serde(flatten)]
        style: Style,
    },
    /// An arrow; `from` defaults to the origin.
    Vector {
        #[serde(default)]
        from: Option<Coord>,
        #[serde(default)]
        to: Option<Coord>,
        #[serde(flatten)]
        style: Style,
    },
    /// The infinite line through two points, clipped to the domain.
    Line {
        #[serde(default)]
        from: Option<Coord>,
        #[serde(default)]
        to: Option<Coord>,
        #[serde(flatten)]
        style: Style,
    },
    Segment {
        #[serde(default)]
        from: Option<Coord>,
        #[serde(default)]
        to: Option<Coord>,
        #[serde(flatten)]
        style: Style,
    },
    Circle {
        #[serde(default)]
        center: Option<Coord>,
        #[serde(default)]
        radius: Option<Number>,
        #[serde(flatten)]
        style: Style,
    },
    Polygon {
        #[serde(default)]
        points: Vec<Coord>,
        #[serde(flatten)]
        style: Style,
    },
    Function {
        #[serde(default)]
        expr: Option<String>,
        #[serde(flatten)]
        style: Style,
    },
}

fn finite(c: Coord) -> Option<Point<Number>> {
    let [x, y] = c;
    (x.is_finite() && y.is_finite()).then_some(Point::new(x, y))
}

fn both(from: Option<Coord>, to: Option<Coord>) -> Option<(Point<Number>, Point<Number>)> {
    Some((finite(from?)?, finite(to?)?))
}

/// Two distinct points, a line through one point has no direction.
fn distinct(from: Option<Coord>, to: Option<Coord>) -> Option<(Point<Number>, Point<Number>)> {
    both(from, to).filter(|(a, b)| a != b)
}

fn vertices(points: &[Coord]) -> Option<Vec<Point<Number>>> {
    if points.len() < 3 {
        return None;
    }
    points.iter().copied().map(finite).collect()
}

impl GeometryItem {
    pub fn style(&self) -> &Style {
        match self {
            Self::Point { style, .. }
            | Self::Vector { style, .. }
            | Self::Line { style, .. }
            | Self::Segment { style, .. }
            | Self::Circle { style, .. }
            | Self::Polygon { style, .. }
            | Self::Function { style, .. } => style,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Vector { .. } => "vector",
            Self::Line { .. } => "line",
            Self::Segment { .. } => "segment",
            Self::Circle { .. } => "circle",
            Self::Polygon { .. } => "polygon",
            Self::Function { .. } => "function",
        }
    }

    /// Math-space coordinates that bound this item. Empty for malformed items
    /// and for functions, which have no extent of their own.
    pub fn extent(&self) -> Vec<Point<Number>> {
        match *self {
            Self::Point { x, y, .. } => x
                .zip(y)
                .and_then(|(x, y)| finite([x, y]))
                .into_iter()
                .collect(),
            Self::Vector { from, to, .. } => both(Some(from.unwrap_or([0.0, 0.0])), to)
                .map(|(a, b)| vec![a, b])
                .unwrap_or_default(),
            Self::Line { from, to, .. } => distinct(from, to)
                .map(|(a, b)| vec![a, b])
                .unwrap_or_default(),
            Self::Segment { from, to, .. } => both(from, to)
                .map(|(a, b)| vec![a, b])
                .unwrap_or_default(),
            Self::Circle { center, radius, .. } => match (center.and_then(finite), radius) {
                (Some(c), Some(r)) if r.is_finite() && r > 0.0 => vec![
                    Point::new(c.x - r, c.y - r),
                    Point::new(c.x + r, c.y + r),
                ],
                _ => Vec::new(),
            },
            Self::Polygon { ref points, .. } => vertices(points).unwrap_or_default(),
            Self::Function { .. } => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Dot {
        at: Point<Number>,
        radius: Number,
    },
    Arrow {
        from: Point<Number>,
        to: Point<Number>,
        /// The two outer corners of the head, the third is `to`.
        head: [Point<Number>; 2],
    },
    Line {
        from: Point<Number>,
        to: Point<Number>,
    },
    Ellipse {
        center: Point<Number>,
        rx: Number,
        ry: Number,
    },
    Polygon {
        points: Vec<Point<Number>>,
    },
    Curve {
        segments: Vec<Segment>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub at: Point<Number>,
    pub text: String,
}

/// A shape in pixel space with its presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    pub shape: Shape,
    pub color: String,
    pub dashed: bool,
    pub fill: Option<String>,
    pub label: Option<Label>,
}

fn fit_axis(lo: Number, hi: Number) -> Range<Number> {
    let mid = 0.5 * (lo + hi);
    let half = 0.5 * (hi - lo).max(FIT_MIN_SPAN);
    let margin = 2.0 * half * FIT_MARGIN;
    (mid - half - margin)..(mid + half + margin)
}

/// Bounding box of every item, grown by [`FIT_MARGIN`] on each side, or
/// `fallback` when no item has coordinates.
pub fn fit_domain(items: &[GeometryItem], fallback: &Domain) -> Domain {
    let mut points = items.iter().flat_map(GeometryItem::extent).peekable();
    let Some(first) = points.peek().copied() else {
        return fallback.clone();
    };
    let (mut lo, mut hi) = (first, first);
    for p in points {
        lo = Point::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Point::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    Domain::new(fit_axis(lo.x, hi.x), fit_axis(lo.y, hi.y))
}

/// Clips the line through `p` with direction `d` to the domain rectangle.
fn clip_line(
    p: Point<Number>,
    d: Point<Number>,
    domain: &Domain,
) -> Option<(Point<Number>, Point<Number>)> {
    let (mut t0, mut t1) = (Number::NEG_INFINITY, Number::INFINITY);
    for (p, d, range) in [(p.x, d.x, &domain.x), (p.y, d.y, &domain.y)] {
        if d == 0.0 {
            if p < range.start || p > range.end {
                return None;
            }
        } else {
            let a = (range.start - p) / d;
            let b = (range.end - p) / d;
            t0 = t0.max(a.min(b));
            t1 = t1.min(a.max(b));
        }
    }
    (t0 <= t1).then(|| {
        (
            Point::new(p.x + d.x * t0, p.y + d.y * t0),
            Point::new(p.x + d.x * t1, p.y + d.y * t1),
        )
    })
}

fn arrow_head(from: Point<Number>, to: Point<Number>) -> Option<[Point<Number>; 2]> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);
    let back = Point::new(to.x - ux * ARROW_HEAD_PX, to.y - uy * ARROW_HEAD_PX);
    let half = 0.5 * ARROW_HEAD_PX;
    Some([
        Point::new(back.x - uy * half, back.y + ux * half),
        Point::new(back.x + uy * half, back.y - ux * half),
    ])
}

fn midpoint(a: Point<Number>, b: Point<Number>) -> Point<Number> {
    Point::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y))
}

/// Label anchor, nudged up and right of `at`.
fn anchor(at: Point<Number>) -> Point<Number> {
    Point::new(at.x + 6.0, at.y - 6.0)
}

/// Maps one item to its shape and label anchor, `None` if it is malformed.
fn shape(item: &GeometryItem, mapper: &Mapper) -> Option<(Shape, Option<Point<Number>>)> {
    Some(match *item {
        GeometryItem::Point { x, y, .. } => {
            let at = mapper.map(finite([x?, y?])?);
            (
                Shape::Dot {
                    at,
                    radius: POINT_RADIUS_PX,
                },
                Some(anchor(at)),
            )
        }
        GeometryItem::Vector { from, to, .. } => {
            let (from, to) = both(Some(from.unwrap_or([0.0, 0.0])), to)?;
            let (from, to) = (mapper.map(from), mapper.map(to));
            match arrow_head(from, to) {
                Some(head) => (Shape::Arrow { from, to, head }, Some(anchor(to))),
                // a zero vector is just its base point
                None => (
                    Shape::Dot {
                        at: to,
                        radius: POINT_RADIUS_PX,
                    },
                    Some(anchor(to)),
                ),
            }
        }
        GeometryItem::Segment { from, to, .. } => {
            let (from, to) = both(from, to)?;
            let (from, to) = (mapper.map(from), mapper.map(to));
            (Shape::Line { from, to }, Some(anchor(midpoint(from, to))))
        }
        GeometryItem::Line { from, to, .. } => {
            let (a, b) = distinct(from, to)?;
            let dir = Point::new(b.x - a.x, b.y - a.y);
            let (from, to) = clip_line(a, dir, &mapper.domain)?;
            let (from, to) = (mapper.map(from), mapper.map(to));
            (Shape::Line { from, to }, Some(anchor(mapper.map(b))))
        }
        GeometryItem::Circle { center, radius, .. } => {
            let c = finite(center?)?;
            let r = radius.filter(|r| r.is_finite() && *r > 0.0)?;
            let scale = mapper.scale();
            let center = mapper.map(c);
            let ry = r * scale.y;
            (
                Shape::Ellipse {
                    center,
                    rx: r * scale.x,
                    ry,
                },
                Some(anchor(Point::new(center.x, center.y - ry))),
            )
        }
        GeometryItem::Polygon { ref points, .. } => {
            let points: Vec<_> = vertices(points)?.into_iter().map(|p| mapper.map(p)).collect();
            let at = Some(anchor(points[0]));
            (Shape::Polygon { points }, at)
        }
        GeometryItem::Function { ref expr, .. } => {
            let expr = Expr::compile(expr.as_deref()?);
            let mut bindings = Bindings::new(&Params::new());
            let segments = sample::sample(&expr, &mut bindings, mapper, GEOMETRY_STEP_FACTOR);
            // a curve that never enters the canvas has nowhere to put its label
            let at = segments.last().and_then(|segment| segment.last().copied());
            (Shape::Curve { segments }, at.map(anchor))
        }
    })
}

/// Maps items under `mapper`, dropping malformed ones.
pub fn render_items(items: &[GeometryItem], mapper: &Mapper) -> Vec<Drawable> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let Some((shape, at)) = shape(item, mapper) else {
                log::warn!("skipping malformed {} item #{idx}", item.kind());
                return None;
            };
            let style = item.style();
            Some(Drawable {
                shape,
                color: style
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ITEM_COLOR.to_string()),
                dashed: style.dashed,
                fill: style.fill.clone(),
                label: at
                    .zip(style.label.clone())
                    .map(|(at, text)| Label { at, text }),
            })
        })
        .collect()
}

/// A geometry configuration resolved to pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub mapper: Mapper,
    pub drawables: Vec<Drawable>,
}

impl Scene {
    /// Auto-fits the domain when axes are hidden, the configured domain is
    /// then only the fallback for scenes without coordinates.
    pub fn new(config: &GeometryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let configured = to_domain(config.x_domain, config.y_domain);
        let domain = if config.show_axes {
            configured
        } else {
            fit_domain(&config.items, &configured)
        };
        log::debug!(
            "geometry scene over x {:?} (span {}), y {:?}",
            domain.x,
            span(&domain.x),
            domain.y
        );
        let mapper = Mapper::new(domain, config.width, config.height, DEFAULT_PADDING);
        let drawables = render_items(&config.items, &mapper);
        Ok(Self { mapper, drawables })
    }
}
