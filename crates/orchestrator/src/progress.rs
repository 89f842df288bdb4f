//! Human-readable progress reporting.

use tracing::info;

/// Receives progress messages synchronously, in order, on the task running
/// the sequence. Implementations must not block for long.
pub trait ProgressSink: Send {
    fn report(&mut self, message: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str) + Send,
{
    fn report(&mut self, message: &str) {
        self(message)
    }
}

/// Logs every message at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&mut self, message: &str) {
        info!(target: "orchestrator::progress", "{}", message);
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&mut self, _message: &str) {}
}

pub(crate) fn stage_message(stage_number: usize, total_stages: usize) -> String {
    format!("Generating stage {} of {}...", stage_number, total_stages)
}

pub(crate) const COMPLETED_MESSAGE: &str = "All stages generated successfully!";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |m: &str| seen.push(m.to_string());
            sink.report("one");
            sink.report("two");
        }
        assert_eq!(seen, vec!["one", "two"]);
    }

    #[test]
    fn test_builtin_sinks_accept_messages() {
        TracingProgress.report("hello");
        NoopProgress.report("hello");
    }

    #[test]
    fn test_stage_message() {
        assert_eq!(stage_message(1, 4), "Generating stage 1 of 4...");
    }
}
