//! Output sinks for reporting worker results and errors.

use std::fmt::Display;
use std::io::{self, Write};

use serde::Serialize;
use workgate_core::HandlerError;

use crate::supervisor::SupervisorReport;

/// Receives everything the supervisor observes, in arrival order.
pub trait OutputSink<T> {
    /// A value arrived on the results stream.
    fn on_result(&mut self, value: &T);

    /// A failure arrived on the errors stream.
    fn on_error(&mut self, error: &HandlerError);

    /// Shutdown completed.
    fn on_stopped(&mut self, _report: &SupervisorReport) {}
}

/// Plain-text sink: `work done: <value>` / `work error: <message>`.
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    /// Console sink writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Console sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<T: Display, W: Write> OutputSink<T> for ConsoleSink<W> {
    fn on_result(&mut self, value: &T) {
        let _ = writeln!(self.out, "work done: {}", value);
    }

    fn on_error(&mut self, error: &HandlerError) {
        let _ = writeln!(self.out, "work error: {}", error);
    }

    fn on_stopped(&mut self, _report: &SupervisorReport) {
        let _ = writeln!(self.out, "goodbye!");
        let _ = self.out.flush();
    }
}

/// JSON event types that can be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonEventType {
    WorkDone,
    WorkError,
    Stopped,
}

/// A JSON event written as one line.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub event: JsonEventType,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl JsonEvent {
    /// Create a new JSON event with the current timestamp.
    pub fn new(event: JsonEventType, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }
}

/// JSON-lines sink, one [`JsonEvent`] per line.
pub struct JsonSink<W> {
    out: W,
}

impl JsonSink<io::Stdout> {
    /// JSON sink writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonSink<W> {
    /// JSON sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: JsonEvent) {
        if let Ok(json) = serde_json::to_string(&event) {
            let _ = writeln!(self.out, "{}", json);
            let _ = self.out.flush();
        }
    }
}

impl<T: Serialize, W: Write> OutputSink<T> for JsonSink<W> {
    fn on_result(&mut self, value: &T) {
        self.emit(JsonEvent::new(
            JsonEventType::WorkDone,
            serde_json::json!({ "value": value }),
        ));
    }

    fn on_error(&mut self, error: &HandlerError) {
        self.emit(JsonEvent::new(
            JsonEventType::WorkError,
            serde_json::json!({ "error": error.message() }),
        ));
    }

    fn on_stopped(&mut self, report: &SupervisorReport) {
        self.emit(JsonEvent::new(
            JsonEventType::Stopped,
            serde_json::json!({
                "results": report.results,
                "errors": report.errors,
                "reason": report.reason,
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::StopReason;

    fn report() -> SupervisorReport {
        SupervisorReport {
            results: 2,
            errors: 1,
            reason: StopReason::Interrupted,
        }
    }

    #[test]
    fn test_console_format() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.on_result(&42);
        OutputSink::<i32>::on_error(&mut sink, &HandlerError::new("value greater than 50"));
        OutputSink::<i32>::on_stopped(&mut sink, &report());

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "work done: 42\nwork error: value greater than 50\ngoodbye!\n"
        );
    }

    #[test]
    fn test_json_lines() {
        let mut sink = JsonSink::new(Vec::new());
        sink.on_result(&7u32);
        OutputSink::<u32>::on_error(&mut sink, &HandlerError::new("boom"));
        OutputSink::<u32>::on_stopped(&mut sink, &report());

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event"], "work_done");
        assert_eq!(lines[0]["data"]["value"], 7);
        assert_eq!(lines[1]["event"], "work_error");
        assert_eq!(lines[1]["data"]["error"], "boom");
        assert_eq!(lines[2]["event"], "stopped");
        assert_eq!(lines[2]["data"]["reason"], "interrupted");
        assert_eq!(lines[2]["data"]["results"], 2);
        assert!(lines[0]["timestamp"].as_str().is_some());
    }
}
