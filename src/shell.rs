// SPDX: CC0-1.0

use crate::{eval::Program, lex::SubStr};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    AddFun,
    Clear,
    Preset,
    Load,
    SetWin,
    Vars,
    SetVar,
    PrintProg,
    Cross,
    Probe,
    Plot,
    Geometry,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::AddFun,
            Self::Clear,
            Self::Preset,
            Self::Load,
            Self::SetWin,
            Self::Vars,
            Self::SetVar,
            Self::PrintProg,
            Self::Cross,
            Self::Probe,
            Self::Plot,
            Self::Geometry,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::AddFun => "add a function to the plot",
            Self::Clear => "remove all functions and variables",
            Self::Preset => "replace the plot with a named preset",
            Self::Load => "load a plot configuration from a JSON file",
            Self::SetWin => "set the plotted domain",
            Self::Vars => "list variables and their ranges",
            Self::SetVar => "set a variable (clamped to its range)",
            Self::PrintProg => "print programs compiled from the functions (for debugging)",
            Self::Cross => "list intersections between functions",
            Self::Probe => "read values under a pointer position in the fullscreen view",
            Self::Plot => "write the plot to an SVG file",
            Self::Geometry => "render a geometry scene from a JSON file to SVG",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::AddFun => "add",
            Self::Clear => "clear",
            Self::Preset => "preset",
            Self::Load => "load",
            Self::SetWin => "window",
            Self::Vars => "vars",
            Self::SetVar => "var",
            Self::PrintProg => "prog",
            Self::Cross => "cross",
            Self::Probe => "probe",
            Self::Plot => "plot",
            Self::Geometry => "geometry",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or(())
    }
}

/// Returns the candidate most similar to `needle`, if any is similar enough
/// to be worth suggesting.
pub fn most_similar<'a>(
    needle: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<&'a str> {
    let needle = needle.to_ascii_lowercase();
    candidates
        .map(|candidate| {
            (
                strsim::normalized_damerau_levenshtein(&needle, &candidate.to_ascii_lowercase()),
                candidate,
            )
        })
        .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
        .filter(|(sim, _)| *sim > 0.3)
        .map(|(_, candidate)| candidate)
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

pub fn no_functions<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no function is defined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_roundtrip_by_name() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
        assert!("plto".parse::<Command>().is_err());
    }

    #[test]
    fn suggestions() {
        let names = ["sin", "sinh", "sqrt", "cos"];
        assert_eq!(most_similar("sni", names.into_iter()), Some("sin"));
        assert_eq!(most_similar("SQRT", names.into_iter()), Some("sqrt"));
        assert_eq!(most_similar("zzzzzz", names.into_iter()), None);
    }
}
