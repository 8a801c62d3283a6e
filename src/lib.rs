// SPDX: CC0-1.0

pub mod config;
pub mod eval;
pub mod expr;
pub mod geometry;
pub mod intersect;
pub mod label;
pub mod lex;
pub mod map;
pub mod parse;
pub mod plot;
pub mod probe;
pub mod sample;
pub mod shell;
pub mod stdlib;
pub mod svg;
pub mod vars;

use core::{fmt, ops::Range};
use std::collections::BTreeMap;

pub type Number = f64;

/// Named parameter values, ordered by name.
pub type Params = BTreeMap<String, Number>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

pub const DEFAULT_RANGE: Range<Number> = -5.0..5.0;

/// The rectangle of the math plane a plot displays.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub x: Range<Number>,
    pub y: Range<Number>,
}

impl Domain {
    pub const fn new(x: Range<Number>, y: Range<Number>) -> Self {
        Self { x, y }
    }

    pub fn contains(&self, p: Point<Number>) -> bool {
        self.x.start < p.x && p.x < self.x.end && self.y.start < p.y && p.y < self.y.end
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE, DEFAULT_RANGE)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("x range", &self.x)
            .field("y range", &self.y)
            .finish()
    }
}

pub(crate) fn span(range: &Range<Number>) -> Number {
    range.end - range.start
}
