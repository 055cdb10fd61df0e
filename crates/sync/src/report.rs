//! Per-adapter outcomes of one fanned-out operation.

use std::fmt;

/// How one adapter fared.
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub adapter: String,
    /// `None` on success, otherwise the failure message.
    pub error: Option<String>,
}

/// Settled results of fanning one operation out across every adapter.
///
/// Partial failure does not discard the successes: the report records every
/// outcome, and callers receiving it inside
/// [`ErrorKind::Fanout`](crate::error::ErrorKind::Fanout) can see exactly
/// which adapters still hold the document.
#[derive(Debug, Clone)]
pub struct SyncReport {
    operation: &'static str,
    outcomes: Vec<AdapterOutcome>,
}

impl SyncReport {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self { operation, outcomes: Vec::new() }
    }

    pub(crate) fn record_success(&mut self, adapter: &str) {
        self.outcomes.push(AdapterOutcome { adapter: adapter.to_string(), error: None });
    }

    pub(crate) fn record_failure(&mut self, adapter: &str, message: String) {
        self.outcomes.push(AdapterOutcome { adapter: adapter.to_string(), error: Some(message) });
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    pub fn outcomes(&self) -> &[AdapterOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{} adapters succeeded", self.operation, self.succeeded(), self.outcomes.len())?;
        for outcome in self.outcomes.iter().filter(|outcome| outcome.error.is_some()) {
            if let Some(message) = &outcome.error {
                write!(f, "; {} failed: {message}", outcome.adapter)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_summarizes_failures() {
        let mut report = SyncReport::new("save");
        report.record_success("local");
        report.record_failure("host", "connection refused".to_string());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
        let rendered = report.to_string();
        assert!(rendered.contains("save: 1/2 adapters succeeded"));
        assert!(rendered.contains("host failed: connection refused"));
    }
}
