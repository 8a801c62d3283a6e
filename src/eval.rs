// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Number};
use core::fmt;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Pos,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Eq | Self::Ne => 0,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 1,
            Self::Add | Self::Sub => 2,
            Self::Mul | Self::Div | Self::Rem => 3,
            Self::Neg | Self::Pos => 4,
            Self::Exp => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        match self {
            Self::Exp => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    /// Prefix operators bind to the operand that follows them.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg | Self::Pos)
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, stdlib::neg)),
            Self::Pos => ("pos", Fun::new(1, stdlib::pos)),
            Self::Add => ("add", Fun::new(2, stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, stdlib::mul)),
            Self::Div => ("div", Fun::new(2, stdlib::div)),
            Self::Rem => ("rem", Fun::new(2, stdlib::rem)),
            Self::Exp => ("pow", Fun::new(2, stdlib::pow)),
            Self::Lt => ("lt", Fun::new(2, stdlib::lt)),
            Self::Le => ("le", Fun::new(2, stdlib::le)),
            Self::Gt => ("gt", Fun::new(2, stdlib::gt)),
            Self::Ge => ("ge", Fun::new(2, stdlib::ge)),
            Self::Eq => ("eq", Fun::new(2, stdlib::eq)),
            Self::Ne => ("ne", Fun::new(2, stdlib::ne)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    Ident,
    /// A parenthesized call and the number of arguments it was written with.
    Call(usize),
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Ident => write!(f, "call '{}'", self.loc.get()),
            OperationTyp::Call(argc) => write!(
                f,
                "call '{}' with {argc} argument{s}",
                self.loc.get(),
                s = if argc == 1 { "" } else { "s" }
            ),
        }
    }
}

#[derive(Debug)]
pub enum EvalErrTyp {
    Empty,
    MissingArgs {
        name: IdentKey,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
    UndefinedIdent {
        text: SubStr,
    },
    NullVar {
        text: SubStr,
    },
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                name = name.get(),
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} operation{s} on the stack but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::UndefinedIdent { text } => {
                write!(f, "undefined identifier '{}'", text.get())
            }

            EvalErrTyp::NullVar { text } => {
                write!(
                    f,
                    "variable '{}' is declared but its value is not defined",
                    text.get()
                )
            }
        }
    }
}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

#[derive(Clone, Copy, Debug)]
pub struct Fun {
    pub arity: usize,
    /// Takes as many arguments as the call passes, `arity` without parentheses.
    pub variadic: bool,
    pub fun: fn(&[Number]) -> Number,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> Number) -> Self {
        Self {
            arity,
            variadic: false,
            fun,
        }
    }

    pub const fn variadic(fun: fn(&[Number]) -> Number) -> Self {
        Self {
            arity: 2,
            variadic: true,
            fun,
        }
    }

    /// Arguments consumed by a call written with `argc` of them.
    pub const fn takes(&self, argc: usize) -> usize {
        if self.variadic {
            argc
        } else {
            self.arity
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Var(Option<Number>),
    Const(Number),
    Fun(Fun),
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Static(&'static str),
    Owned(String),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Static(s) => s,
            Self::Owned(s) => s,
        }
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

impl From<String> for IdentKey {
    fn from(s: String) -> Self {
        Self::Owned(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

#[derive(Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }
}

pub fn eval(prog: &Program, idents: &Idents, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
    fn expect_exactly_n(
        stack: &[Number],
        op: impl Into<Option<Operation>>,
        n: usize,
    ) -> Result<(), EvalErr> {
        let len = stack.len();
        if len == n {
            Ok(())
        } else {
            Err(EvalErr {
                typ: EvalErrTyp::StackMismatch {
                    expected: n,
                    found: len,
                },
                op: op.into(),
            })
        }
    }

    fn eval_fun(
        stack: &mut Vec<Number>,
        op: &Operation,
        name: impl Into<IdentKey>,
        fun: &Fun,
        arity: usize,
    ) -> Result<Number, EvalErr> {
        let len = stack.len();
        if len < arity {
            return Err(EvalErr {
                typ: EvalErrTyp::MissingArgs {
                    arity,
                    found: len,
                    name: name.into(),
                },
                op: Some(op.clone()),
            });
        }
        // stack: ...a, b, c, d
        //                 ^^^^ args if arity is 2
        let base = len - arity;
        let val = (fun.fun)(&stack[base..]);
        stack.truncate(base);
        Ok(val)
    }

    if prog.ops.is_empty() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    stack.clear();

    for op in prog.ops() {
        let val = match op.typ {
            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                eval_fun(stack, op, name, &fun, fun.arity)?
            }

            OperationTyp::Val(num) => num,

            OperationTyp::Ident | OperationTyp::Call(_) => {
                let sym = op.loc.clone();
                match idents.get(&sym.clone().into()) {
                    Some(Ident::Var(None)) => {
                        return Err(EvalErr {
                            typ: EvalErrTyp::NullVar { text: sym },
                            op: Some(op.clone()),
                        });
                    }
                    Some(Ident::Var(Some(val)) | Ident::Const(val)) => *val,
                    Some(Ident::Fun(fun)) => {
                        let arity = match op.typ {
                            OperationTyp::Call(argc) => fun.takes(argc),
                            _ => fun.arity,
                        };
                        eval_fun(stack, op, sym, fun, arity)?
                    }
                    None => {
                        return Err(EvalErr {
                            typ: EvalErrTyp::UndefinedIdent { text: sym },
                            op: Some(op.clone()),
                        });
                    }
                }
            }
        };
        stack.push(val);
    }

    expect_exactly_n(stack, None, 1)?;
    stack.pop().ok_or(EvalErr {
        typ: EvalErrTyp::Empty,
        op: None,
    })
}
