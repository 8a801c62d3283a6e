// SPDX: CC0-1.0

//! Compiled expressions with the "undefined means NaN" evaluation contract.
//!
//! An [`Expr`] is lexed and parsed once. Evaluating it never fails: parse
//! errors, evaluation errors and unbound identifiers all produce
//! [`Number::NAN`]. [`Expr::try_eval`] keeps the error around for callers that
//! want to explain it.

use crate::{
    eval::{self, EvalErr, Ident, IdentKey, Idents, Program},
    lex::Lexer,
    parse::{self, ParseErr},
    stdlib::{self, X},
    Number, Params,
};
use std::sync::Arc;

#[derive(Debug)]
pub struct Expr {
    src: Arc<String>,
    prog: Result<Program, ParseErr>,
}

impl Expr {
    pub fn compile(src: &str) -> Self {
        let src = Arc::new(src.to_string());
        let prog = parse::parse(Lexer::new(&src), &stdlib::standard_idents());
        if let Err(ref err) = prog {
            log::debug!("expression {src:?} does not compile: {err}");
        }
        Self { src, prog }
    }

    pub fn src(&self) -> &Arc<String> {
        &self.src
    }

    pub fn program(&self) -> Result<&Program, &ParseErr> {
        self.prog.as_ref()
    }

    /// Evaluates at `x`; any failure yields NaN.
    pub fn eval(&self, bindings: &mut Bindings, x: Number) -> Number {
        match self.prog {
            Ok(ref prog) => bindings.run(prog, x).unwrap_or(Number::NAN),
            Err(_) => Number::NAN,
        }
    }

    pub fn try_eval(&self, bindings: &mut Bindings, x: Number) -> Result<Number, EvalFailure<'_>> {
        match self.prog {
            Ok(ref prog) => bindings.run(prog, x).map_err(EvalFailure::Eval),
            Err(ref err) => Err(EvalFailure::Parse(err)),
        }
    }
}

#[derive(Debug)]
pub enum EvalFailure<'a> {
    Parse(&'a ParseErr),
    Eval(EvalErr),
}

/// Identifier table with `x` and parameters bound, plus a reusable stack.
#[derive(Debug)]
pub struct Bindings {
    idents: Idents,
    stack: Vec<Number>,
}

impl Bindings {
    pub fn new(params: &Params) -> Self {
        let mut idents = stdlib::standard_idents();
        for (name, val) in params {
            // parameters shadow constants of the same name
            idents.insert(name.clone().into(), Ident::Var(Some(*val)));
        }
        idents.insert(X.into(), Ident::Var(None));
        Self {
            idents,
            stack: Vec::new(),
        }
    }

    pub fn idents(&self) -> &Idents {
        &self.idents
    }

    fn run(&mut self, prog: &Program, x: Number) -> Result<Number, EvalErr> {
        self.idents.insert(IdentKey::Static(X), Ident::Var(Some(x)));
        eval::eval(prog, &self.idents, &mut self.stack)
    }
}

/// One-shot evaluation of `src` at `x`.
pub fn evaluate(src: &str, x: Number, params: &Params) -> Number {
    Expr::compile(src).eval(&mut Bindings::new(params), x)
}
