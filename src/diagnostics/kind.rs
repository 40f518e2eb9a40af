//! Diagnostic kinds and predefined codes.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - something is definitely wrong.
    Error,
    /// A warning - something is probably wrong or suboptimal.
    Warning,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
        }
    }
}

/// A diagnostic message with code and optional context.
///
/// Codes follow the pattern:
/// - `EA0xx` - Allocation failures
/// - `EA1xx` - Engine control issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "EA001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.kind.prefix(), self.message)
    }
}

// =============================================================================
// Predefined diagnostics (EA0xx - Allocation failures)
// =============================================================================

/// EA001: Arena cannot hold the request.
pub const EA001: Diagnostic = Diagnostic::warning(
    "EA001",
    "allocation failed: arena out of space"
).with_note("in-use bytes plus the request exceed the arena, or no free block is large enough")
 .with_help("raise arena_capacity in SimConfig, or pick a strategy that fragments less");

/// EA002: Request breaks a strategy rule.
pub const EA002: Diagnostic = Diagnostic::warning(
    "EA002",
    "request violates the strategy's structural constraint"
).with_note("e.g. a request larger than the pool slot")
 .with_help("size pool_block_size for the workload, or let the selector route it");

/// EA003: Free of an unknown or ineligible block.
pub const EA003: Diagnostic = Diagnostic::warning(
    "EA003",
    "deallocation refused"
).with_note("the block was never allocated, was already freed, or is not eligible yet (stack order, linear arena)");

// =============================================================================
// Predefined diagnostics (EA1xx - Engine control)
// =============================================================================

/// EA101: Benchmark could not start.
pub const EA101: Diagnostic = Diagnostic::error(
    "EA101",
    "benchmark could not start"
).with_help("wait for the running benchmark to finish, or call reset()");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_codes() {
        assert_eq!(EA001.to_string(), "[EA001] warning: allocation failed: arena out of space");
        assert!(EA001.help.is_some());
        assert_eq!(EA101.kind, DiagnosticKind::Error);
    }
}
