use std::io::{self, Write};

/// Line-oriented destination for screen output.
///
/// Implementations receive one encoded event per call, without a trailing
/// newline, and must not fail the caller.
pub trait ConsoleSink: Send + Sync {
    fn emit(&self, line: &[u8]);
}

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn emit(&self, line: &[u8]) {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line);
        buf.push(b'\n');
        // A closed stdout (e.g. `| head`) must not take the crawl down.
        let _ = io::stdout().lock().write_all(&buf);
    }
}
