// SPDX: CC0-1.0

//! Seam to the math typesetting collaborator used for curve labels.

use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Block,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RenderError {
    pub reason: String,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "formula rendering failed: {}", self.reason)
    }
}

pub trait FormulaRenderer {
    fn render(&self, src: &str, mode: MathMode) -> Result<String, RenderError>;
}

/// Renders formulas as themselves. Rejects text with unbalanced braces or
/// a trailing backslash, which no typesetter would accept either.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainText {
    /// Suppresses the debug log on failures.
    pub quiet: bool,
}

impl FormulaRenderer for PlainText {
    fn render(&self, src: &str, mode: MathMode) -> Result<String, RenderError> {
        let mut depth: i32 = 0;
        for chr in src.chars() {
            match chr {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 || src.ends_with('\\') {
            return Err(RenderError {
                reason: "unbalanced markup".to_string(),
            });
        }
        Ok(match mode {
            MathMode::Inline => src.to_string(),
            MathMode::Block => src.trim().to_string(),
        })
    }
}

/// Renders `src`, falling back to the source text itself on failure.
pub fn render_or_plain<R: FormulaRenderer>(renderer: &R, src: &str, mode: MathMode) -> String {
    match renderer.render(src, mode) {
        Ok(rendered) => rendered,
        Err(err) => {
            log::debug!("label {src:?}: {err}");
            src.to_string()
        }
    }
}

impl PlainText {
    pub fn label(&self, src: &str) -> String {
        if self.quiet {
            self.render(src, MathMode::Inline)
                .unwrap_or_else(|_| src.to_string())
        } else {
            render_or_plain(self, src, MathMode::Inline)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl FormulaRenderer for Failing {
        fn render(&self, _: &str, _: MathMode) -> Result<String, RenderError> {
            Err(RenderError {
                reason: "always".to_string(),
            })
        }
    }

    #[test]
    fn failure_returns_source() {
        assert_eq!(render_or_plain(&Failing, r"\frac{1}{x}", MathMode::Block), r"\frac{1}{x}");
        assert_eq!(PlainText::default().label("y = {x"), "y = {x");
    }

    #[test]
    fn plain_text_passes_through() {
        let r = PlainText { quiet: true };
        assert_eq!(r.render(" x^{2} ", MathMode::Block), Ok("x^{2}".to_string()));
        assert!(r.render("}{", MathMode::Inline).is_err());
    }
}
