use crate::domain::model::ExtractionTrace;

pub const NO_METHOD: &str = "none";

/// Append-only accumulator for one pipeline invocation.
///
/// Owned exclusively by the running pipeline; `finish` consumes it and hands
/// back an immutable `ExtractionTrace`.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    steps: Vec<String>,
    method_used: Option<&'static str>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("extraction: {}", message);
        self.steps.push(message);
    }

    /// Records that a strategy was entered. Only the first one sticks.
    pub fn enter(&mut self, label: &'static str) {
        if self.method_used.is_none() {
            self.method_used = Some(label);
        }
    }

    pub fn method_used(&self) -> Option<&'static str> {
        self.method_used
    }

    pub fn finish(self, result_count: usize) -> ExtractionTrace {
        ExtractionTrace {
            steps: self.steps,
            method_used: self.method_used.unwrap_or(NO_METHOD).to_string(),
            result_count,
        }
    }
}
