use std::cell::RefCell;

/// Severity of a user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
}

/// A non-fatal message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Message surface shown to the user.
///
/// Nothing reported here stops an evaluation pass.
pub trait Reporter {
    fn report(&self, diagnostic: Diagnostic);

    fn warn(&self, message: &str) {
        self.report(Diagnostic::warning(message));
    }

    fn error(&self, message: &str) {
        self.report(Diagnostic::error(message));
    }
}

/// Forwards diagnostics to the `log` facade and stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Warning => {
                log::warn!("{}", diagnostic.message);
                eprintln!("Warning: {}", diagnostic.message);
            }
            Level::Error => {
                log::error!("{}", diagnostic.message);
                eprintln!("Error: {}", diagnostic.message);
            }
        }
    }
}

/// Keeps every diagnostic in memory, in arrival order
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics
            .borrow()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.warn("first");
        reporter.error("second");
        let diags = reporter.diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0], Diagnostic::warning("first"));
        assert_eq!(diags[1].level, Level::Error);
    }
}
