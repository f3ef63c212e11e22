//! CLI-specific error types
//!
//! All CLI errors are fatal; main prints them and exits non-zero.

use std::fmt;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Boot failed
    BootFailed,
    /// Migration input error
    MigrationFailed,
    /// Verification pass failed
    VerificationFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DOCVAULT_CLI_CONFIG_ERROR",
            Self::IoError => "DOCVAULT_CLI_IO_ERROR",
            Self::AlreadyInitialized => "DOCVAULT_CLI_ALREADY_INITIALIZED",
            Self::BootFailed => "DOCVAULT_CLI_BOOT_FAILED",
            Self::MigrationFailed => "DOCVAULT_CLI_MIGRATION_FAILED",
            Self::VerificationFailed => "DOCVAULT_CLI_VERIFICATION_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_message() {
        let err = CliError::new(CliErrorCode::ConfigError, "bad json");
        let rendered = format!("{}", err);
        assert!(rendered.contains("DOCVAULT_CLI_CONFIG_ERROR"));
        assert!(rendered.contains("bad json"));
    }
}
