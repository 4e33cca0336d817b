//! Run-scoped tracing context.
//!
//! Every invocation gets a fresh trace id so its log lines can be grouped,
//! including lines emitted from inside adapter crates.

use tracing::Span;
use uuid::Uuid;

/// Generate a new identifier for one run.
#[must_use]
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Root span for one run, carrying the trace id and crate version.
#[must_use]
pub fn run_span(trace_id: &str) -> Span {
    tracing::info_span!(
        "reseed",
        trace_id = %trace_id,
        version = env!("CARGO_PKG_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ids_are_unique_uuids() {
        let first = new_trace_id();
        let second = new_trace_id();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn run_span_can_be_entered() {
        let span = run_span("abc");
        let _entered = span.enter();
    }
}
