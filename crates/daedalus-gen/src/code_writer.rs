//! Indentation-tracking writer for the generated artifact.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Writes lines at the current indentation level.
///
/// ```
/// use daedalus_gen::code_writer::CodeWriter;
///
/// let mut out = String::new();
/// let mut w = CodeWriter::new(&mut out);
/// w.block("mod m", |w| w.writeln("fn f() {}")).unwrap();
/// assert_eq!(out, "mod m {\n    fn f() {}\n}\n");
/// ```
pub struct CodeWriter<W> {
    writer: W,
    indent_level: Rc<Cell<usize>>,
}

impl<W: fmt::Write> CodeWriter<W> {
    /// Creates a writer with four-space indentation.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent_level: Rc::new(Cell::new(0)),
        }
    }

    /// Writes `text` as one or more indented lines.
    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return self.blank_line();
        }
        for line in text.lines() {
            if !line.trim().is_empty() {
                for _ in 0..self.indent_level.get() {
                    self.writer.write_str("    ")?;
                }
                self.writer.write_str(line)?;
            }
            self.writer.write_char('\n')?;
        }
        Ok(())
    }

    /// Writes an empty line.
    pub fn blank_line(&mut self) -> fmt::Result {
        self.writer.write_char('\n')
    }

    /// Writes `// text` comment lines.
    pub fn comment(&mut self, text: &str) -> fmt::Result {
        for line in text.lines() {
            self.writeln(&format!("// {line}"))?;
        }
        Ok(())
    }

    /// Increases indentation until the guard is dropped.
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// Writes `header {`, the body one level deeper, then `}`.
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.writeln(&format!("{header} {{"))?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln("}")
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Restores the indentation level when dropped.
#[must_use = "indentation reverts when the guard is dropped"]
pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.indent_level.set(self.indent_level.get().saturating_sub(1));
    }
}
