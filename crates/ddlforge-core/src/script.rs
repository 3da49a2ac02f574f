//! Sequential DDL script output.
//!
//! A [`ScriptWriter`] owns its sink for the duration of one generation
//! run: statements go out one by one, each terminated by a convention
//! the caller picks independently of the dialect, and the sink is
//! flushed and handed back by [`ScriptWriter::finish`] (or flushed
//! best-effort on drop when generation fails partway).

use std::io::{self, Write};

/// Writes an ordered stream of DDL statements to a sink.
#[derive(Debug)]
pub struct ScriptWriter<W: Write> {
    sink: Option<W>,
    terminator: String,
    written: usize,
}

impl<W: Write> ScriptWriter<W> {
    /// Creates a writer with the conventional `;` terminator.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Some(sink),
            terminator: String::from(";"),
            written: 0,
        }
    }

    /// Overrides the statement terminator.
    #[must_use]
    pub fn terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    /// Writes one statement, logically terminated.
    pub fn write_statement(&mut self, statement: &str) -> io::Result<()> {
        let sink = self
            .sink
            .as_mut()
            .expect("sink is present until finish() consumes the writer");
        writeln!(sink, "{statement}{}", self.terminator)?;
        self.written += 1;
        Ok(())
    }

    /// Writes a sequence of statements.
    pub fn write_all(&mut self, statements: &[String]) -> io::Result<()> {
        for statement in statements {
            self.write_statement(statement)?;
        }
        Ok(())
    }

    /// Number of statements written so far.
    #[must_use]
    pub fn statements_written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the sink.
    pub fn finish(mut self) -> io::Result<W> {
        let mut sink = self.sink.take().expect("finish() runs once");
        sink.flush()?;
        Ok(sink)
    }
}

impl<W: Write> Drop for ScriptWriter<W> {
    fn drop(&mut self) {
        // A partially written script is still flushed when the run
        // aborts; the error it aborted with is the one that matters.
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_terminated_and_counted() {
        let mut writer = ScriptWriter::new(Vec::new());
        writer.write_statement("DROP TABLE a").unwrap();
        writer
            .write_all(&["CREATE TABLE a (\n    x INTEGER\n)".to_string()])
            .unwrap();
        assert_eq!(writer.statements_written(), 2);

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "DROP TABLE a;\nCREATE TABLE a (\n    x INTEGER\n);\n");
    }

    #[test]
    fn terminator_is_configurable() {
        let mut writer = ScriptWriter::new(Vec::new()).terminator("\nGO");
        writer.write_statement("DROP TABLE a").unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "DROP TABLE a\nGO\n");
    }
}
