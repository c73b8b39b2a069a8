//! Append-only, severity-tagged diagnostic bag shared across every compiler phase.
//!
//! Diagnostics never mutate after emission (`spec.md` §3, §5): phases push into
//! the bag and later phases (and the driver) only ever read it back.

use std::fmt;

/// Severity of a single diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Which phase produced a diagnostic, per the wire format in `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Lexer,
    Parser,
    Type,
    Ownership,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lexer => write!(f, "lexer"),
            Category::Parser => write!(f, "parser"),
            Category::Type => write!(f, "type"),
            Category::Ownership => write!(f, "ownership"),
        }
    }
}

/// 1-based line/column span, length in characters, length >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub len: u32,
}

impl Span {
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        debug_assert!(len >= 1, "diagnostic spans must cover at least one column");
        Self { line, col, len: len.max(1) }
    }

    /// A zero-width point, widened to length 1 (used for synthesized tokens).
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    /// `SEVERITY CATEGORY (L,C,N): message`, per `spec.md` §6.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({},{},{}): {}",
            self.severity, self.category, self.span.line, self.span.col, self.span.len, self.message
        )
    }
}

/// Append-only diagnostic bag. Cloning is shallow (`Vec` clone) and cheap
/// enough for the driver to stash a copy into a cached `CompilationResult`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, category: Category, span: Span, message: impl Into<String>) {
        self.messages.push(Diagnostic { severity, category, span, message: message.into() });
    }

    pub fn error(&mut self, category: Category, span: Span, message: impl Into<String>) {
        self.push(Severity::Error, category, span, message);
    }

    pub fn warning(&mut self, category: Category, span: Span, message: impl Into<String>) {
        self.push(Severity::Warning, category, span, message);
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// One line per diagnostic, in the `spec.md` §6 wire format.
    pub fn render_wire(&self) -> String {
        self.messages.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n")
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.messages
    }

    /// Renders every diagnostic against `source` with source snippets and
    /// color, for the thin CLI. Presentational only; `success` is always
    /// computed from `render_wire`'s severities, never from this.
    pub fn render_pretty(&self, file_name: &str, source: &str, color: bool) -> String {
        use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label};
        use codespan_reporting::files::SimpleFiles;
        use codespan_reporting::term::{self, Config};

        let mut files = SimpleFiles::new();
        let file_id = files.add(file_name, source);
        let config = Config::default();
        let mut buffer = if color { ::termcolor::Buffer::ansi() } else { ::termcolor::Buffer::no_color() };

        for d in &self.messages {
            let offset = line_col_to_byte_offset(source, d.span.line, d.span.col);
            let range = offset..(offset + d.span.len as usize).min(source.len()).max(offset);
            let label = Label::primary(file_id, range).with_message(d.message.clone());
            let cs = match d.severity {
                Severity::Error => CsDiagnostic::error(),
                Severity::Warning => CsDiagnostic::warning(),
            }
            .with_message(format!("[{}] {}", d.category, d.message))
            .with_labels(vec![label]);
            let _ = term::emit(&mut buffer, &config, &files, &cs);
        }
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

/// 1-based line/col (`spec.md` §3 span convention) to a 0-based byte offset
/// into `source`, for handing a span to `codespan-reporting`.
fn line_col_to_byte_offset(source: &str, line: u32, col: u32) -> usize {
    let mut offset = 0usize;
    for (i, text) in source.split('\n').enumerate() {
        if i as u32 + 1 == line {
            return offset + (col.saturating_sub(1) as usize).min(text.len());
        }
        offset += text.len() + 1;
    }
    source.len()
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;
    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_matches_spec() {
        let mut bag = Diagnostics::new();
        bag.error(Category::Type, Span::new(3, 5, 1), "cannot assign float to int");
        assert_eq!(bag.render_wire(), "error type (3,5,1): cannot assign float to int");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut bag = Diagnostics::new();
        bag.warning(Category::Parser, Span::point(1, 1), "unused legacy terminator");
        assert!(!bag.has_errors());
        bag.error(Category::Parser, Span::point(1, 1), "missing token");
        assert!(bag.has_errors());
    }
}
