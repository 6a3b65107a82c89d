//! Per-request diagnostic stream
//!
//! A caller can ask for a narrated run (`log=true`). When enabled, each
//! step is emitted as an `info`/`error` event on the `ddns::diagnostic`
//! target; the installed subscriber adds the timestamp and level. When
//! disabled nothing is emitted. The stream never changes behavior.

use std::fmt::Display;

/// Tracing target of diagnostic events
pub const DIAGNOSTIC_TARGET: &str = "ddns::diagnostic";

/// Gated diagnostic logger for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    enabled: bool,
}

impl DiagnosticLog {
    /// Create a logger, emitting only when `enabled`
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether events are emitted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emit an INFO line
    pub fn info(&self, message: impl Display) {
        if self.enabled {
            tracing::info!(target: DIAGNOSTIC_TARGET, "{}", message);
        }
    }

    /// Emit an ERROR line
    pub fn error(&self, message: impl Display) {
        if self.enabled {
            tracing::error!(target: DIAGNOSTIC_TARGET, "{}", message);
        }
    }
}
