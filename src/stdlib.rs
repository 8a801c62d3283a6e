// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

pub const X: &str = "x";

const UNARY: &[(&str, fn(&[Number]) -> Number)] = &[
    ("abs", abs),
    ("sign", sign),
    ("sqrt", sqrt),
    ("cbrt", cbrt),
    ("exp", exp),
    ("expm1", expm1),
    ("ln", ln),
    // natural logarithm, as in the authoring dialect
    ("log", ln),
    ("log10", log10),
    ("log2", log2),
    ("log1p", log1p),
    ("floor", floor),
    ("ceil", ceil),
    ("round", round),
    ("trunc", trunc),
    // trig
    ("sin", sin),
    ("cos", cos),
    ("tan", tan),
    ("asin", arcsin),
    ("acos", arccos),
    ("atan", arctan),
    ("arcsin", arcsin),
    ("arccos", arccos),
    ("arctan", arctan),
    ("sinh", sinh),
    ("cosh", cosh),
    ("tanh", tanh),
    ("asinh", asinh),
    ("acosh", acosh),
    ("atanh", atanh),
];

const BINARY: &[(&str, fn(&[Number]) -> Number)] = &[
    ("pow", pow),
    ("atan2", atan2),
    ("logb", logb),
];

const VARIADIC: &[(&str, fn(&[Number]) -> Number)] = &[
    ("min", min),
    ("max", max),
    ("hypot", hypot),
];

const CONSTS: &[(&str, Number)] = &[
    ("pi", consts::PI),
    ("PI", consts::PI),
    ("tau", consts::TAU),
    ("e", consts::E),
    ("E", consts::E),
    ("SQRT2", consts::SQRT_2),
    ("SQRT1_2", consts::FRAC_1_SQRT_2),
    ("LN2", consts::LN_2),
    ("LN10", consts::LN_10),
    ("LOG2E", consts::LOG2_E),
    ("LOG10E", consts::LOG10_E),
];

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    for (name, fun) in UNARY {
        ret.insert((*name).into(), Ident::Fun(Fun::new(1, *fun)));
    }
    for (name, fun) in BINARY {
        ret.insert((*name).into(), Ident::Fun(Fun::new(2, *fun)));
    }
    for (name, fun) in VARIADIC {
        ret.insert((*name).into(), Ident::Fun(Fun::variadic(*fun)));
    }
    for (name, val) in CONSTS {
        ret.insert((*name).into(), Ident::Const(*val));
    }
    ret
}

fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    // the evaluator always passes exactly `arity` arguments
    args.try_into().unwrap_or([Number::NAN; N])
}

const fn truth(cond: bool) -> Number {
    if cond {
        1.0
    } else {
        0.0
    }
}

pub fn neg(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    -x
}

pub fn pos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x
}

pub fn add(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x + y
}

pub fn sub(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x - y
}

pub fn mul(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x * y
}

pub fn div(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x / y
}

pub fn rem(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x % y
}

pub fn pow(args: &[Number]) -> Number {
    let [x, exp] = expect_n::<2>(args);
    x.powf(exp)
}

pub fn lt(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    truth(x < y)
}

pub fn le(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    truth(x <= y)
}

pub fn gt(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    truth(x > y)
}

pub fn ge(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    truth(x >= y)
}

pub fn eq(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    truth(x == y)
}

pub fn ne(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    truth(x != y)
}

pub fn abs(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.abs()
}

pub fn sign(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

pub fn sqrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sqrt()
}

pub fn cbrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cbrt()
}

pub fn exp(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.exp()
}

pub fn expm1(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.exp_m1()
}

pub fn ln(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ln()
}

pub fn log10(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log10()
}

pub fn log2(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log2()
}

pub fn log1p(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ln_1p()
}

pub fn logb(args: &[Number]) -> Number {
    let [x, base] = expect_n::<2>(args);
    x.log(base)
}

pub fn floor(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.floor()
}

pub fn ceil(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ceil()
}

/// Halves round toward positive infinity.
pub fn round(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    let r = x.floor();
    if x - r >= 0.5 {
        r + 1.0
    } else {
        r
    }
}

pub fn trunc(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.trunc()
}

/// Folds `args` with `f`, NaN if any argument is.
fn fold_or_nan(args: &[Number], init: Number, f: fn(Number, Number) -> Number) -> Number {
    if args.iter().any(|x| x.is_nan()) {
        Number::NAN
    } else {
        args.iter().copied().fold(init, f)
    }
}

pub fn min(args: &[Number]) -> Number {
    fold_or_nan(args, Number::INFINITY, Number::min)
}

pub fn max(args: &[Number]) -> Number {
    fold_or_nan(args, Number::NEG_INFINITY, Number::max)
}

pub fn hypot(args: &[Number]) -> Number {
    // an infinite side wins over NaN
    if args.iter().any(|x| x.is_infinite()) {
        return Number::INFINITY;
    }
    fold_or_nan(args, 0.0, Number::hypot)
}

pub fn sin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sin()
}

pub fn cos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cos()
}

pub fn tan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tan()
}

pub fn arcsin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.asin()
}

pub fn arccos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.acos()
}

pub fn arctan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.atan()
}

pub fn atan2(args: &[Number]) -> Number {
    let [y, x] = expect_n::<2>(args);
    y.atan2(x)
}

pub fn sinh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sinh()
}

pub fn cosh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cosh()
}

pub fn tanh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tanh()
}

pub fn asinh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.asinh()
}

pub fn acosh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.acosh()
}

pub fn atanh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.atanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &'static str, args: &[Number]) -> Number {
        match standard_idents().get(&name.into()) {
            Some(Ident::Fun(fun)) if fun.takes(args.len()) == args.len() => (fun.fun)(args),
            other => panic!("{name} is not a {}-ary function: {other:?}", args.len()),
        }
    }

    #[test]
    fn log_is_natural() {
        assert!((call("log", &[consts::E]) - 1.0).abs() < 1e-12);
        assert!((call("logb", &[8.0, 2.0]) - 3.0).abs() < 1e-12);
        assert!(call("log", &[-1.0]).is_nan());
    }

    #[test]
    fn round_half_up() {
        assert_eq!(call("round", &[2.5]), 3.0);
        assert_eq!(call("round", &[-2.5]), -2.0);
        assert_eq!(call("round", &[-2.6]), -3.0);
        assert_eq!(call("round", &[0.49999999999999994]), 0.0);
        assert_eq!(call("round", &[4503599627370497.0]), 4503599627370497.0);
        assert_eq!(call("round", &[-0.5]), 0.0);
    }

    #[test]
    fn min_max_propagate_nan() {
        assert!(call("min", &[Number::NAN, 1.0]).is_nan());
        assert!(call("max", &[1.0, Number::NAN]).is_nan());
        assert_eq!(call("max", &[-1.0, 2.0]), 2.0);
        assert!(call("min", &[3.0, 1.0, Number::NAN]).is_nan());
    }

    #[test]
    fn variadic_extremes() {
        assert_eq!(call("max", &[1.0, 2.0, 3.0]), 3.0);
        assert_eq!(call("min", &[1.0, -2.0, 3.0, 0.0]), -2.0);
        assert_eq!(call("min", &[]), Number::INFINITY);
        assert_eq!(call("hypot", &[]), 0.0);
        assert_eq!(call("hypot", &[-5.0]), 5.0);
        assert_eq!(call("hypot", &[Number::NAN, Number::NEG_INFINITY]), Number::INFINITY);
    }

    #[test]
    fn sign_keeps_zero() {
        assert_eq!(call("sign", &[-3.0]), -1.0);
        assert_eq!(call("sign", &[0.0]), 0.0);
        assert!(call("sign", &[Number::NAN]).is_nan());
    }

    #[test]
    fn bad_arity_is_nan() {
        assert!(sin(&[]).is_nan());
        assert!(add(&[1.0]).is_nan());
    }

    #[test]
    fn comparisons_are_numbers() {
        assert_eq!(lt(&[1.0, 2.0]), 1.0);
        assert_eq!(ge(&[1.0, 2.0]), 0.0);
        assert_eq!(ne(&[Number::NAN, Number::NAN]), 1.0);
    }
}
