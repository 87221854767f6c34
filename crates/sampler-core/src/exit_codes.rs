//! Exit codes for the sampler binary.
//!
//! Service managers restart on any non-zero code; the value tells the
//! operator which subsystem refused to come up.
//!
//! Exit code ranges:
//! - 0-6: Operational outcomes
//! - 10-19: Environment errors (fixable by the operator)
//! - 20-29: Internal errors (bugs, should be reported)

/// Exit codes for sampler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-6)
    // ========================================================================
    /// Loop stopped on request after a clean shutdown
    Clean = 0,

    /// Stopped by SIGINT/SIGTERM; any pending batch was discarded
    Interrupted = 6,

    // ========================================================================
    // Environment Errors (10-19)
    // ========================================================================
    /// Missing or invalid environment configuration
    ConfigError = 10,

    /// Sensor or display could not be initialized
    HardwareError = 11,

    /// Queue unreachable or rejected the handshake
    QueueError = 12,

    /// Batch directories could not be created or scanned
    StorageError = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code is an operational outcome (codes 0-6).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is an environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON logs).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Interrupted => "OK_INTERRUPTED",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::HardwareError => "ERR_HARDWARE",
            ExitCode::QueueError => "ERR_QUEUE",
            ExitCode::StorageError => "ERR_STORAGE",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_operational());
        assert!(ExitCode::Interrupted.is_operational());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::StorageError.is_user_error());
        assert!(ExitCode::InternalError.is_internal_error());
        assert!(!ExitCode::QueueError.is_internal_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::HardwareError.to_string(), "ERR_HARDWARE (11)");
        assert_eq!(i32::from(ExitCode::Interrupted), 6);
    }
}
