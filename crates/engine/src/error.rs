// ABOUTME: Error types for the NeuroFlow engine including ErrorCode enum and EngineError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing different categories of engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Detached,
    Parse,
    Config,
    Command,
    Io,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Detached => "node not attached to a document",
            ErrorCode::Parse => "parse error",
            ErrorCode::Config => "invalid configuration",
            ErrorCode::Command => "unknown command",
            ErrorCode::Io => "i/o error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub struct EngineError {
    pub code: ErrorCode,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "neuroflow: {}: {}", self.op, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl EngineError {
    fn new(code: ErrorCode, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code,
            op: op.into(),
            source,
        }
    }

    /// Create a Detached error.
    pub fn detached(op: impl Into<String>) -> Self {
        Self::new(ErrorCode::Detached, op, None)
    }

    /// Create a Parse error.
    pub fn parse(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Parse, op, source)
    }

    /// Create a Config error.
    pub fn config(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Config, op, source)
    }

    /// Create a Command error for an action name the engine does not know.
    pub fn command(action: &str) -> Self {
        Self::new(
            ErrorCode::Command,
            "dispatch",
            Some(anyhow::anyhow!("unrecognized action {:?}", action)),
        )
    }

    /// Create an Io error.
    pub fn io(op: impl Into<String>, source: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, op, Some(source.into()))
    }

    /// Returns true if this is a Detached error.
    pub fn is_detached(&self) -> bool {
        self.code == ErrorCode::Detached
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }

    /// Returns true if this is a Command error.
    pub fn is_command(&self) -> bool {
        self.code == ErrorCode::Command
    }

    /// Returns true if this is an Io error.
    pub fn is_io(&self) -> bool {
        self.code == ErrorCode::Io
    }
}

/// Convenience alias used across the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_code_and_source() {
        let err = EngineError::config("options", Some(anyhow::anyhow!("font step is zero")));
        assert_eq!(
            err.to_string(),
            "neuroflow: options: invalid configuration: font step is zero"
        );
        assert!(err.is_config());
        assert!(!err.is_parse());
    }

    #[test]
    fn command_error_names_the_action() {
        let err = EngineError::command("TOGGLE_NOTHING");
        assert!(err.is_command());
        assert!(err.to_string().contains("TOGGLE_NOTHING"));
    }
}
