// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Ident, Idents, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.typ, self.loc)
    }
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun,
    OpenParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
    /// Arguments seen so far, only counted on open parentheses.
    args: usize,
}

impl ShuntOp {
    /// Whether this operator, sitting on the stack, must be emitted before
    /// `incoming` is pushed.
    fn yields_to(&self, incoming: OperatorTyp) -> bool {
        match self.typ {
            ShuntOpTyp::OpenParen => false,
            // a call without parentheses (`sin x`) binds tighter than anything
            ShuntOpTyp::Fun => true,
            ShuntOpTyp::Operator(op) => {
                op.precedence() > incoming.precedence()
                    || (op.precedence() == incoming.precedence()
                        && incoming.associativity() == Associativity::Left)
            }
        }
    }

    const fn new(typ: ShuntOpTyp, loc: SubStr) -> Self {
        Self { typ, loc, args: 0 }
    }

    fn into_output(self) -> Option<Operation> {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Fun => OperationTyp::Ident,
            ShuntOpTyp::OpenParen => return None,
        };
        Some(Operation { typ, loc: self.loc })
    }
}

/// Moves operators to `out` until an open parenthesis (left on the stack) or
/// the bottom of the stack.
fn drain_to_paren(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) {
    while let Some(op) = ops.last() {
        if op.typ == ShuntOpTyp::OpenParen {
            break;
        }
        if let Some(op) = ops.pop().and_then(ShuntOp::into_output) {
            out.push(op);
        }
    }
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Program, ParseErr> {
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack

    // whether the previous token opened a parenthesis, so `f()` has no arguments
    let mut after_open = false;

    for tok in lex {
        let tok = tok?;
        let opens = tok.typ == TokTyp::OpenParen;
        match tok.typ {
            TokTyp::Number => {
                let num: Number = tok.loc.get().parse().map_err(|err| ParseErr {
                    typ: ParseErrTyp::ParseNum(err),
                    loc: tok.loc.clone(),
                })?;
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => {
                if let Some(Ident::Fun(_)) = idents.get(&tok.loc.clone().into()) {
                    ops.push(ShuntOp::new(ShuntOpTyp::Fun, tok.loc));
                } else {
                    // constants and variables, including ones we don't know
                    // about yet (they are resolved at evaluation)
                    out.push(Operation {
                        typ: OperationTyp::Ident,
                        loc: tok.loc,
                    });
                }
            }

            TokTyp::Op(o1) => {
                if !o1.is_prefix() {
                    while let Some(o2) = ops.last() {
                        if !o2.yields_to(o1) {
                            break;
                        }
                        if let Some(op) = ops.pop().and_then(ShuntOp::into_output) {
                            out.push(op);
                        }
                    }
                }
                ops.push(ShuntOp::new(ShuntOpTyp::Operator(o1), tok.loc));
            }

            TokTyp::Comma => {
                drain_to_paren(&mut ops, &mut out);
                if let Some(paren) = ops.last_mut() {
                    paren.args += 1;
                }
            }

            TokTyp::OpenParen => {
                let mut paren = ShuntOp::new(ShuntOpTyp::OpenParen, tok.loc);
                paren.args = 1;
                ops.push(paren);
            }

            TokTyp::CloseParen => {
                drain_to_paren(&mut ops, &mut out);

                let Some(paren) = ops.pop() else {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    });
                };
                let argc = if after_open { 0 } else { paren.args };

                // handle functions
                if let Some(ShuntOp {
                    typ: ShuntOpTyp::Fun,
                    ..
                }) = ops.last()
                {
                    if let Some(fun) = ops.pop() {
                        out.push(Operation {
                            typ: OperationTyp::Call(argc),
                            loc: fun.loc,
                        });
                    }
                }
            }

            TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XBang
            | TokTyp::XAmpersand
            | TokTyp::XQuestion
            | TokTyp::XColon
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => unreachable!("unsupported token survived until parsing"),
        }
        after_open = opens;
    }

    while let Some(op) = ops.pop() {
        let loc = op.loc.clone();
        match op.into_output() {
            Some(op) => out.push(op),
            None => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc,
                })
            }
        }
    }

    Ok(Program::new(out))
}
