// SPDX: CC0-1.0

//! Approximate pairwise intersections of plotted functions.

use crate::{
    expr::{Bindings, Expr},
    span, Number,
};
use core::ops::Range;
use serde::Serialize;

/// Samples per function pair, independent of the rendered width.
pub const INTERSECTION_STEPS: usize = 1000;

/// Largest jump of `f_i - f_j` between neighbouring samples that still counts
/// as a crossing. Bigger jumps are asymptotes where both sides diverge.
pub const INTERSECTION_JUMP_LIMIT: Number = 10.0;

/// Bisection rounds applied to each bracketed root.
pub const REFINE_ITERATIONS: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection {
    pub x: Number,
    pub y: Number,
    pub f_idx1: usize,
    pub f_idx2: usize,
}

impl Intersection {
    pub const fn involves(&self, idx: usize) -> bool {
        self.f_idx1 == idx || self.f_idx2 == idx
    }
}

struct Pair<'a> {
    f: &'a Expr,
    g: &'a Expr,
}

impl Pair<'_> {
    fn diff(&self, bindings: &mut Bindings, x: Number) -> Number {
        self.f.eval(bindings, x) - self.g.eval(bindings, x)
    }

    /// Narrows a sign change of the difference within `[lo, hi]`, starting
    /// from the linear interpolation of the bracket.
    fn refine(
        &self,
        bindings: &mut Bindings,
        (mut lo, mut d_lo): (Number, Number),
        (mut hi, d_hi): (Number, Number),
    ) -> Number {
        let guess = lo - d_lo * (hi - lo) / (d_hi - d_lo);
        for _ in 0..REFINE_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            let d_mid = self.diff(bindings, mid);
            if !d_mid.is_finite() {
                return guess;
            }
            if d_mid == 0.0 {
                return mid;
            }
            if (d_mid < 0.0) == (d_lo < 0.0) {
                lo = mid;
                d_lo = d_mid;
            } else {
                hi = mid;
            }
        }
        // the final bracket is tiny, interpolate inside it
        let d_hi = self.diff(bindings, hi);
        if d_hi.is_finite() && d_hi != d_lo {
            lo - d_lo * (hi - lo) / (d_hi - d_lo)
        } else {
            0.5 * (lo + hi)
        }
    }
}

/// Finds crossings for every pair `(i, j)`, `i < j`, in registration order.
///
/// Within a pair, intersections come out in increasing x. Across pairs there
/// is no global ordering.
pub fn find_intersections(
    funcs: &[Expr],
    x_range: &Range<Number>,
    bindings: &mut Bindings,
) -> Vec<Intersection> {
    let mut found = Vec::new();
    let step = span(x_range) / INTERSECTION_STEPS as Number;
    if !(step.is_finite() && step > 0.0) {
        return found;
    }

    for (i, f) in funcs.iter().enumerate() {
        for (j, g) in funcs.iter().enumerate().skip(i + 1) {
            let pair = Pair { f, g };
            let mut push = |bindings: &mut Bindings, x: Number| {
                let y = f.eval(bindings, x);
                found.push(Intersection {
                    x,
                    y,
                    f_idx1: i,
                    f_idx2: j,
                });
            };

            let mut prev: Option<(Number, Number)> = None;
            for k in 0..=INTERSECTION_STEPS {
                let x = if k == INTERSECTION_STEPS {
                    x_range.end
                } else {
                    x_range.start + step * k as Number
                };
                let d = pair.diff(bindings, x);
                if !d.is_finite() {
                    prev = None;
                    continue;
                }
                match prev {
                    // touching zero counts once, however long it stays there
                    Some((_, d0)) if d == 0.0 => {
                        if d0 != 0.0 {
                            push(bindings, x);
                        }
                    }
                    None if d == 0.0 => push(bindings, x),
                    Some((x0, d0)) => {
                        if d0 != 0.0
                            && (d0 < 0.0) != (d < 0.0)
                            && (d - d0).abs() < INTERSECTION_JUMP_LIMIT
                        {
                            let root = pair.refine(bindings, (x0, d0), (x, d));
                            push(bindings, root);
                        }
                    }
                    None => {}
                }
                prev = Some((x, d));
            }
        }
    }

    log::debug!(
        "found {} intersection(s) among {} function(s)",
        found.len(),
        funcs.len()
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    fn find(srcs: &[&str], x_range: Range<Number>) -> Vec<Intersection> {
        let funcs: Vec<Expr> = srcs.iter().map(|src| Expr::compile(src)).collect();
        find_intersections(&funcs, &x_range, &mut Bindings::new(&Params::new()))
    }

    #[test]
    fn crossing_lines() {
        let found = find(&["x", "2-x"], -5.0..5.0);
        assert_eq!(found.len(), 1);
        let hit = found[0];
        assert!((hit.x - 1.0).abs() < 1e-6);
        assert!((hit.y - 1.0).abs() < 1e-6);
        assert_eq!((hit.f_idx1, hit.f_idx2), (0, 1));
    }

    #[test]
    fn asymptotes_are_not_crossings() {
        assert!(find(&["1/x", "-1/x"], -5.0..5.0).is_empty());
        assert!(find(&["1/x", "-1/x"], -4.3..3.7).is_empty());
    }

    #[test]
    fn pairs_in_order_and_x_sorted_within_pair() {
        let found = find(&["x*x - 4", "0", "x"], -5.0..5.0);
        let pairs: Vec<(usize, usize)> = found.iter().map(|i| (i.f_idx1, i.f_idx2)).collect();
        assert_eq!(pairs, [(0, 1), (0, 1), (0, 2), (0, 2), (1, 2)]);
        assert!((found[0].x + 2.0).abs() < 1e-6);
        assert!((found[1].x - 2.0).abs() < 1e-6);
        assert!(found[2].x < found[3].x);
        // the root at the origin is reported once
        assert!(found[4].x.abs() < 1e-9);
    }

    #[test]
    fn identical_functions_report_one_touch() {
        assert_eq!(find(&["x", "x"], -5.0..5.0).len(), 1);
    }

    #[test]
    fn parameters_move_intersections() {
        let funcs = [Expr::compile("a*x"), Expr::compile("1")];
        let mut params = Params::new();
        params.insert("a".to_string(), 2.0);
        let found = find_intersections(&funcs, &(-5.0..5.0), &mut Bindings::new(&params));
        assert_eq!(found.len(), 1);
        assert!((found[0].x - 0.5).abs() < 1e-6);
    }
}
