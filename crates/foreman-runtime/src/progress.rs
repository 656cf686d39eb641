//! Progress output for waits in flight.
//!
//! One symbol per non-terminal poll: `-` while the resource is pending,
//! `.` while it is in progress, then a line with the terminal status.

use std::io::Write;

use foreman_core::StatusClass;
use parking_lot::Mutex;

/// Anything that accepts chunks of progress text.
pub trait ProgressSink: Send + Sync {
    fn write(&self, chunk: &str);
}

/// Writes progress to standard output, flushing each chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ProgressSink for StdoutSink {
    fn write(&self, chunk: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(chunk.as_bytes());
        let _ = out.flush();
    }
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn write(&self, _chunk: &str) {}
}

/// Collects progress in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: Mutex<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buf.lock().clone()
    }
}

impl ProgressSink for BufferSink {
    fn write(&self, chunk: &str) {
        self.buf.lock().push_str(chunk);
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn write(&self, chunk: &str) {
        (self.0)(chunk)
    }
}

/// Per-wait progress state.
pub(crate) struct Indicator<'a> {
    sink: &'a dyn ProgressSink,
    wrote: bool,
}

impl<'a> Indicator<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, wrote: false }
    }

    pub(crate) fn tick(&mut self, class: StatusClass) {
        let symbol = match class {
            StatusClass::Pending => "-",
            _ => ".",
        };
        self.sink.write(symbol);
        self.wrote = true;
    }

    pub(crate) fn finish(&mut self, status: &str) {
        if self.wrote {
            self.sink.write("\n");
        }
        self.sink.write(status);
        self.sink.write("\n");
        self.wrote = false;
    }
}

// Close a dangling progress line when a wait ends in an error.
impl Drop for Indicator<'_> {
    fn drop(&mut self) {
        if self.wrote {
            self.sink.write("\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_indicator_symbols() {
        let sink = BufferSink::new();
        let mut indicator = Indicator::new(&sink);
        indicator.tick(StatusClass::Pending);
        indicator.tick(StatusClass::InProgress);
        indicator.tick(StatusClass::InProgress);
        indicator.finish("ACTIVE");
        assert_eq!(sink.contents(), "-..\nACTIVE\n");
    }

    #[test]
    fn test_indicator_immediate_terminal() {
        let sink = BufferSink::new();
        Indicator::new(&sink).finish("CREATE_FAILED");
        assert_eq!(sink.contents(), "CREATE_FAILED\n");
    }

    #[test]
    fn test_dropped_indicator_ends_line() {
        let sink = BufferSink::new();
        {
            let mut indicator = Indicator::new(&sink);
            indicator.tick(StatusClass::Pending);
            indicator.tick(StatusClass::Pending);
        }
        assert_eq!(sink.contents(), "--\n");
    }

    #[test]
    fn test_fn_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = FnSink(move |chunk: &str| captured.lock().push(chunk.to_string()));
        sink.write("-");
        sink.write(".");
        assert_eq!(*seen.lock(), vec!["-", "."]);
    }
}
