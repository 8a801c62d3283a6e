// SPDX: CC0-1.0

//! Pointer tracking for the fullscreen view: crosshair position, snapping to
//! intersections, and the tooltip rows.

use crate::{intersect::Intersection, map::Mapper, Number, Point};

/// Distance within which the pointer snaps onto an intersection, in pixels.
pub const SNAP_THRESHOLD_PX: Number = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ProbeState {
    #[default]
    Idle,
    Active {
        pointer: Point<Number>,
    },
}

impl ProbeState {
    pub fn enter(&mut self, pointer: Point<Number>) {
        *self = Self::Active { pointer };
    }

    /// Moves the pointer. A move while idle counts as entering.
    pub fn moved(&mut self, pointer: Point<Number>) {
        self.enter(pointer);
    }

    pub fn leave(&mut self) {
        *self = Self::Idle;
    }

    pub const fn pointer(&self) -> Option<Point<Number>> {
        match *self {
            Self::Idle => None,
            Self::Active { pointer } => Some(pointer),
        }
    }
}

/// Math x under `pointer_x`, clamped to the domain, and the intersection it
/// snaps to, if any. The first intersection within the threshold wins.
pub fn resolve<'a>(
    mapper: &Mapper,
    pointer_x: Number,
    intersections: &'a [Intersection],
) -> (Number, Option<&'a Intersection>) {
    let x_range = &mapper.domain.x;
    let x = mapper.unmap_x(pointer_x).clamp(x_range.start, x_range.end);
    match intersections
        .iter()
        .find(|hit| (mapper.map_x(hit.x) - pointer_x).abs() < SNAP_THRESHOLD_PX)
    {
        Some(hit) => (hit.x, Some(hit)),
        None => (x, None),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProbeRow {
    pub label: String,
    pub color: String,
    pub val: Number,
    /// Set on both functions of a snapped intersection.
    pub highlighted: bool,
}

/// Tooltip content for one pointer position.
#[derive(Clone, Debug, PartialEq)]
pub struct Readout {
    pub x: Number,
    pub screen_x: Number,
    pub intersection: Option<Intersection>,
    pub intersection_screen_y: Option<Number>,
    pub ys: Vec<ProbeRow>,
}

impl Readout {
    /// `rows` yields `(label, color, value at x)` in registration order.
    pub fn new<'a, I>(mapper: &Mapper, x: Number, snapped: Option<&Intersection>, rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, Number)>,
    {
        let ys = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (label, color, val))| ProbeRow {
                label: label.to_string(),
                color: color.to_string(),
                val,
                highlighted: snapped.map(|hit| hit.involves(idx)).unwrap_or(false),
            })
            .collect();
        Self {
            x,
            screen_x: mapper.map_x(x),
            intersection: snapped.copied(),
            intersection_screen_y: snapped.map(|hit| mapper.map_y(hit.y)),
            ys,
        }
    }
}
