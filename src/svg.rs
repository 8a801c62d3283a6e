// SPDX: CC0-1.0

//! SVG documents for plots and geometry scenes, drawn through plotters.
//!
//! Everything is laid out by [`Mapper`] first, so the drawing area works in
//! plain pixel coordinates.

use crate::{
    config::GeometryConfig,
    geometry::{Drawable, Scene, Shape},
    label::PlainText,
    map::Mapper,
    plot::FunctionPlot,
    span, Number, Point,
};
use core::ops::Range;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

pub const GRID_COLOR: RGBColor = RGBColor(0xe5, 0xe7, 0xeb);
pub const AXIS_COLOR: RGBColor = RGBColor(0x37, 0x41, 0x51);
pub const TEXT_COLOR: RGBColor = RGBColor(0x11, 0x18, 0x27);

const CURVE_WIDTH: u32 = 2;
const MARKER_RADIUS: Number = 4.0;
const FONT_SIZE: Number = 12.0;
const FONT: &str = "sans-serif";

/// Dash and gap lengths of dashed strokes, in pixels.
const DASH_ON: Number = 6.0;
const DASH_OFF: Number = 4.0;

/// Vertices used to trace an ellipse.
const ELLIPSE_STEPS: usize = 72;

/// Ticks aimed for per axis.
const TARGET_TICKS: Number = 7.0;

#[derive(Debug, thiserror::Error)]
#[error("failed to draw svg: {0}")]
pub struct DrawError(String);

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for DrawError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self(err.to_string())
    }
}

/// Tick positions inside `range` on a 1-2-5 step.
pub fn nice_ticks(range: &Range<Number>) -> Vec<Number> {
    let (lo, hi) = (range.start, range.end);
    let rough = span(range) / TARGET_TICKS;
    if !(rough.is_finite() && rough > 0.0) {
        return Vec::new();
    }

    let magnitude = (10.0 as Number).powf(rough.log10().floor());
    let normalized = rough / magnitude;
    let factor = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    let step = factor * magnitude;

    let start = (lo / step).ceil();
    (0..)
        .map(|k| (start + k as Number) * step)
        .take_while(|v| *v <= hi + step * 1e-3)
        .collect()
}

/// Short decimal text for tick labels and readouts.
pub fn fmt_num(v: Number) -> String {
    // + 0.0 turns -0 into 0
    let rounded = (v * 1e6).round() / 1e6 + 0.0;
    format!("{rounded}")
}

const NAMED_COLORS: &[(&str, RGBColor)] = &[
    ("black", BLACK),
    ("white", WHITE),
    ("red", RED),
    ("green", GREEN),
    ("blue", BLUE),
    ("yellow", YELLOW),
    ("cyan", CYAN),
    ("magenta", MAGENTA),
    ("gray", RGBColor(0x80, 0x80, 0x80)),
    ("grey", RGBColor(0x80, 0x80, 0x80)),
    ("orange", RGBColor(0xff, 0xa5, 0x00)),
    ("purple", RGBColor(0x80, 0x00, 0x80)),
];

/// Parses `#rgb`, `#rrggbb` or a basic color name.
pub fn parse_color(text: &str) -> Option<RGBColor> {
    let text = text.trim();
    let Some(hex) = text.strip_prefix('#') else {
        return NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(text))
            .map(|(_, color)| *color);
    };
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0; 3];
            for (dst, i) in rgb.iter_mut().zip(0..3) {
                // #abc is #aabbcc
                *dst = channel(&hex[i..=i])? * 0x11;
            }
            Some(RGBColor(rgb[0], rgb[1], rgb[2]))
        }
        6 => Some(RGBColor(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

fn color_or_text(text: &str) -> RGBColor {
    parse_color(text).unwrap_or_else(|| {
        log::debug!("unknown color {text:?}, using the text color");
        TEXT_COLOR
    })
}

fn px(p: Point<Number>) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn lerp(a: Point<Number>, b: Point<Number>, t: Number) -> Point<Number> {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Splits a polyline into dashes of [`DASH_ON`] pixels, [`DASH_OFF`] apart.
fn dashes(points: &[Point<Number>]) -> Vec<Vec<Point<Number>>> {
    let mut out = Vec::new();
    let mut dash = Vec::new();
    let (mut on, mut left) = (true, DASH_ON);
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = (b.x - a.x).hypot(b.y - a.y);
        if on && dash.is_empty() {
            dash.push(a);
        }
        let mut t = 0.0;
        while len - t > left {
            t += left;
            dash.push(lerp(a, b, t / len));
            if on {
                out.push(core::mem::take(&mut dash));
            }
            on = !on;
            left = if on { DASH_ON } else { DASH_OFF };
        }
        left -= len - t;
        if on {
            dash.push(b);
        }
    }
    if dash.len() > 1 {
        out.push(dash);
    }
    out
}

fn ellipse_points(center: Point<Number>, rx: Number, ry: Number) -> Vec<Point<Number>> {
    (0..ELLIPSE_STEPS)
        .map(|i| {
            let t = core::f64::consts::TAU * i as Number / ELLIPSE_STEPS as Number;
            Point::new(center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect()
}

struct Svg<'a> {
    area: DrawingArea<SVGBackend<'a>, Shift>,
}

impl<'a> Svg<'a> {
    fn new(buf: &'a mut String, width: Number, height: Number) -> Result<Self, DrawError> {
        let size = (width.round() as u32, height.round() as u32);
        let area = SVGBackend::with_string(buf, size).into_drawing_area();
        area.fill(&WHITE)?;
        Ok(Self { area })
    }

    fn path(
        &self,
        points: &[Point<Number>],
        style: ShapeStyle,
        dashed: bool,
    ) -> Result<(), DrawError> {
        if dashed {
            for dash in dashes(points) {
                self.path(&dash, style, false)?;
            }
            return Ok(());
        }
        let coords: Vec<_> = points.iter().copied().map(px).collect();
        self.area.draw(&PathElement::new(coords, style))?;
        Ok(())
    }

    fn line(
        &self,
        a: Point<Number>,
        b: Point<Number>,
        color: RGBColor,
        dashed: bool,
    ) -> Result<(), DrawError> {
        self.path(&[a, b], color.stroke_width(1), dashed)
    }

    fn dot(&self, at: Point<Number>, radius: Number, style: ShapeStyle) -> Result<(), DrawError> {
        self.area.draw(&Circle::new(px(at), radius, style))?;
        Ok(())
    }

    /// A closed outline over an optional fill.
    fn polygon(
        &self,
        points: &[Point<Number>],
        stroke: RGBColor,
        fill: Option<RGBColor>,
        dashed: bool,
    ) -> Result<(), DrawError> {
        if let Some(fill) = fill {
            let coords: Vec<_> = points.iter().copied().map(px).collect();
            self.area.draw(&Polygon::new(coords, fill.filled()))?;
        }
        let mut outline = points.to_vec();
        outline.extend(points.first().copied());
        self.path(&outline, stroke.stroke_width(CURVE_WIDTH), dashed)
    }

    fn text(
        &self,
        at: Point<Number>,
        pos: Pos,
        color: RGBColor,
        text: &str,
    ) -> Result<(), DrawError> {
        let style = (FONT, FONT_SIZE).into_font().color(&color).pos(pos);
        self.area.draw(&Text::new(text.to_string(), px(at), style))?;
        Ok(())
    }

    /// Grid lines, axes with tick labels, and the axis names.
    fn frame(
        &self,
        mapper: &Mapper,
        grid: bool,
        axes: Option<&[String; 2]>,
    ) -> Result<(), DrawError> {
        let Mapper { ref domain, .. } = *mapper;
        let (left, right) = (mapper.map_x(domain.x.start), mapper.map_x(domain.x.end));
        let (bottom, top) = (mapper.map_y(domain.y.start), mapper.map_y(domain.y.end));
        let x_ticks = nice_ticks(&domain.x);
        let y_ticks = nice_ticks(&domain.y);

        if grid {
            for &x in &x_ticks {
                let px = mapper.map_x(x);
                self.line(Point::new(px, top), Point::new(px, bottom), GRID_COLOR, false)?;
            }
            for &y in &y_ticks {
                let py = mapper.map_y(y);
                self.line(Point::new(left, py), Point::new(right, py), GRID_COLOR, false)?;
            }
        }

        let Some([x_name, y_name]) = axes else {
            return Ok(());
        };
        // axes pass through the origin, or hug the nearest edge
        let ax = mapper.map_x((0.0 as Number).clamp(domain.x.start, domain.x.end));
        let ay = mapper.map_y((0.0 as Number).clamp(domain.y.start, domain.y.end));
        self.line(Point::new(left, ay), Point::new(right, ay), AXIS_COLOR, false)?;
        self.line(Point::new(ax, top), Point::new(ax, bottom), AXIS_COLOR, false)?;

        let below = Pos::new(HPos::Center, VPos::Top);
        for &x in x_ticks.iter().filter(|x| **x != 0.0) {
            let at = Point::new(mapper.map_x(x), ay + 4.0);
            self.text(at, below, AXIS_COLOR, &fmt_num(x))?;
        }
        let beside = Pos::new(HPos::Right, VPos::Center);
        for &y in y_ticks.iter().filter(|y| **y != 0.0) {
            let at = Point::new(ax - 4.0, mapper.map_y(y));
            self.text(at, beside, AXIS_COLOR, &fmt_num(y))?;
        }

        let x_at = Point::new(right, ay - 6.0);
        self.text(x_at, Pos::new(HPos::Right, VPos::Bottom), TEXT_COLOR, x_name)?;
        let y_at = Point::new(ax + 6.0, top);
        self.text(y_at, Pos::new(HPos::Left, VPos::Top), TEXT_COLOR, y_name)
    }

    fn drawable(&self, drawable: &Drawable, show_label: bool) -> Result<(), DrawError> {
        let Drawable {
            ref shape,
            ref color,
            dashed,
            ref fill,
            ref label,
        } = *drawable;
        let stroke = color_or_text(color);
        let fill = fill.as_deref().map(color_or_text);
        match *shape {
            Shape::Dot { at, radius } => {
                self.dot(at, radius, fill.unwrap_or(stroke).filled())?;
            }
            Shape::Arrow { from, to, head } => {
                self.path(&[from, to], stroke.stroke_width(CURVE_WIDTH), dashed)?;
                self.polygon(&[to, head[0], head[1]], stroke, Some(stroke), false)?;
            }
            Shape::Line { from, to } => {
                self.path(&[from, to], stroke.stroke_width(CURVE_WIDTH), dashed)?;
            }
            Shape::Ellipse { center, rx, ry } => {
                self.polygon(&ellipse_points(center, rx, ry), stroke, fill, dashed)?;
            }
            Shape::Polygon { ref points } => self.polygon(points, stroke, fill, dashed)?,
            Shape::Curve { ref segments } => {
                for segment in segments {
                    self.path(segment, stroke.stroke_width(CURVE_WIDTH), dashed)?;
                }
            }
        }
        match label {
            Some(label) if show_label => {
                let pos = Pos::new(HPos::Left, VPos::Bottom);
                self.text(label.at, pos, stroke, &label.text)
            }
            _ => Ok(()),
        }
    }

    fn finish(self) -> Result<(), DrawError> {
        self.area.present()?;
        Ok(())
    }
}

/// The plot at `width`x`height` pixels: grid, axes, curves, intersection
/// markers and a legend.
pub fn plot_document(
    plot: &mut FunctionPlot,
    width: Number,
    height: Number,
) -> Result<String, DrawError> {
    let mapper = plot.mapper(width, height);
    let curves = plot.curves(&mapper);
    let domain = plot.domain().clone();
    let hits: Vec<_> = plot
        .intersections()
        .iter()
        .map(|hit| Point::new(hit.x, hit.y))
        .filter(|at| domain.contains(*at))
        .collect();

    let mut buf = String::new();
    {
        let svg = Svg::new(&mut buf, width, height)?;
        svg.frame(&mapper, true, Some(&["x".to_string(), "y".to_string()]))?;

        for curve in &curves {
            let style = color_or_text(&curve.color).stroke_width(CURVE_WIDTH);
            for segment in &curve.segments {
                svg.path(segment, style, false)?;
            }
        }

        for at in hits {
            let at = mapper.map(at);
            svg.dot(at, MARKER_RADIUS, WHITE.filled())?;
            svg.dot(at, MARKER_RADIUS, TEXT_COLOR.stroke_width(CURVE_WIDTH))?;
        }

        let renderer = PlainText::default();
        let legend = Pos::new(HPos::Left, VPos::Center);
        for (idx, function) in plot.functions().iter().enumerate() {
            let color = color_or_text(&function.color);
            let y = mapper.padding + FONT_SIZE + idx as Number * (FONT_SIZE + 4.0);
            let x = mapper.padding + 8.0;
            let swatch = [Point::new(x, y), Point::new(x + 16.0, y)];
            svg.path(&swatch, color.stroke_width(CURVE_WIDTH), false)?;
            let text = renderer.label(&function.label);
            svg.text(Point::new(x + 22.0, y), legend, color, &text)?;
        }

        svg.finish()?;
    }
    Ok(buf)
}

/// A resolved geometry scene, framed as `config` asks.
pub fn geometry_document(scene: &Scene, config: &GeometryConfig) -> Result<String, DrawError> {
    let mapper = &scene.mapper;
    let mut buf = String::new();
    {
        let svg = Svg::new(&mut buf, mapper.width, mapper.height)?;
        let axes = config.show_axes.then_some(&config.axis_labels);
        svg.frame(mapper, config.show_grid, axes)?;

        for drawable in &scene.drawables {
            svg.drawable(drawable, !config.hide_labels)?;
        }

        if let Some(ref title) = config.title {
            let at = Point::new(0.5 * mapper.width, 0.5 * mapper.padding);
            svg.text(at, Pos::new(HPos::Center, VPos::Center), TEXT_COLOR, title)?;
        }

        svg.finish()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlotConfig, PlotFunction};

    fn count(doc: &str, needle: &str) -> usize {
        doc.matches(needle).count()
    }

    #[test]
    fn ticks_on_nice_steps() {
        assert_eq!(nice_ticks(&(-5.0..5.0)), [-4.0, -2.0, 0.0, 2.0, 4.0]);
        let unit = nice_ticks(&(0.0..1.0));
        assert_eq!(unit.len(), 6);
        assert!((unit[5] - 1.0).abs() < 1e-12);
        assert!(nice_ticks(&(1.0..1.0)).is_empty());
    }

    #[test]
    fn numbers_round_for_display() {
        assert_eq!(fmt_num(0.1 + 0.2), "0.3");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(-2.5), "-2.5");
    }

    #[test]
    fn colors() {
        assert_eq!(parse_color("#2563eb"), Some(RGBColor(0x25, 0x63, 0xeb)));
        assert_eq!(parse_color("#ccc"), Some(RGBColor(0xcc, 0xcc, 0xcc)));
        assert_eq!(parse_color(" Red "), Some(RED));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gg0000"), None);
        assert_eq!(parse_color("#ééé"), None);
        assert_eq!(parse_color("teal-ish"), None);
    }

    #[test]
    fn dashes_alternate_along_the_path() {
        let line = [Point::new(0.0, 0.0), Point::new(20.0, 0.0)];
        let runs = dashes(&line);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], [Point::new(0.0, 0.0), Point::new(6.0, 0.0)]);
        assert_eq!(runs[1], [Point::new(10.0, 0.0), Point::new(16.0, 0.0)]);

        // a dash keeps going around a corner
        let corner = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
        ];
        let runs = dashes(&corner);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 3);
        assert_eq!(runs[0][2], Point::new(4.0, 2.0));
    }

    #[test]
    fn plot_has_curves_markers_and_legend() {
        let config = PlotConfig {
            functions: vec![PlotFunction::new("x"), PlotFunction::new("2-x")],
            ..PlotConfig::default()
        };
        let mut plot = FunctionPlot::new(config, None).unwrap();
        let doc = plot_document(&mut plot, 600.0, 400.0).unwrap();
        assert!(doc.contains("<svg"));
        assert!(doc.trim_end().ends_with("</svg>"));
        // one intersection, filled then outlined
        assert_eq!(count(&doc, "<circle"), 2);
        assert!(doc.contains(">y = 2-x</text>"));
        assert!(doc.contains(">y = x</text>"));
    }

    #[test]
    fn plot_escapes_labels() {
        let config = PlotConfig {
            functions: vec![PlotFunction::new("x < 1")],
            ..PlotConfig::default()
        };
        let mut plot = FunctionPlot::new(config, None).unwrap();
        let doc = plot_document(&mut plot, 600.0, 400.0).unwrap();
        assert!(doc.contains("y = x &lt; 1"));
        assert!(!doc.contains("x < 1"));
    }

    #[test]
    fn geometry_honors_flags() {
        let items = serde_json::from_str(
            r#"[{"type":"point","x":1,"y":1,"label":"A"},
                {"type":"vector","to":[2,1]}]"#,
        )
        .unwrap();
        let mut config = GeometryConfig::new(items);
        config.title = Some("Vectors & points".to_string());
        let scene = Scene::new(&config).unwrap();
        let framed = geometry_document(&scene, &config).unwrap();
        assert_eq!(count(&framed, "<circle"), 1);
        // the arrow head
        assert_eq!(count(&framed, "<polygon"), 1);
        assert!(framed.contains(">A</text>"));
        assert!(framed.contains(">x</text>"));
        assert!(framed.contains("Vectors &amp; points"));

        config.show_grid = false;
        config.show_axes = false;
        config.hide_labels = true;
        let scene = Scene::new(&config).unwrap();
        let bare = geometry_document(&scene, &config).unwrap();
        assert!(count(&bare, "<polyline") < count(&framed, "<polyline"));
        assert!(!bare.contains(">A</text>"));
        assert!(!bare.contains(">x</text>"));
        assert_eq!(count(&bare, "<circle"), 1);
    }

    #[test]
    fn dashed_items_break_into_runs() {
        let solid: Vec<_> = serde_json::from_str(
            r#"[{"type":"segment","from":[-4,0],"to":[4,0]},
                {"type":"circle","center":[0,0],"radius":3}]"#,
        )
        .unwrap();
        let mut config = GeometryConfig::new(solid);
        config.show_grid = false;
        config.show_axes = false;
        let scene = Scene::new(&config).unwrap();
        let doc = geometry_document(&scene, &config).unwrap();
        assert_eq!(count(&doc, "<polyline"), 2);

        let mut dashed = scene;
        for drawable in &mut dashed.drawables {
            drawable.dashed = true;
        }
        let doc = geometry_document(&dashed, &config).unwrap();
        assert!(count(&doc, "<polyline") > 20);
    }
}
