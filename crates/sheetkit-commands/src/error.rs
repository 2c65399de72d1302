//! Error types for the command subsystem.

use thiserror::Error;

/// Error reported by a command callback or execution hook.
///
/// Execution errors never propagate out of `execute`; they are routed to
/// the error hook and the command's `failed` signal. The type is `Clone`
/// so one error instance can fan out to every connected listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The callback ran and reported a failure.
    #[error("command failed: {0}")]
    Failed(String),
    /// A precondition checked by the callback or before-hook did not hold.
    #[error("command precondition not met: {0}")]
    Precondition(String),
}

impl CommandError {
    /// Shorthand for [`CommandError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed(message.into())
    }

    /// Shorthand for [`CommandError::Precondition`].
    pub fn precondition(message: impl Into<String>) -> Self {
        CommandError::Precondition(message.into())
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError::Failed(message)
    }
}

impl From<&str> for CommandError {
    fn from(message: &str) -> Self {
        CommandError::Failed(message.to_string())
    }
}

/// Error returned when a subscription request is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscribeError {
    /// Property tracking was requested but no property handler was given.
    #[error("property tracking requested without a property handler")]
    MissingPropertyHandler,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CommandError::failed("sheet is read-only").to_string(),
            "command failed: sheet is read-only"
        );
        assert_eq!(
            CommandError::precondition("no selection").to_string(),
            "command precondition not met: no selection"
        );
        assert_eq!(
            SubscribeError::MissingPropertyHandler.to_string(),
            "property tracking requested without a property handler"
        );
    }

    #[test]
    fn test_from_str() {
        let err: CommandError = "boom".into();
        assert_eq!(err, CommandError::Failed("boom".to_string()));
    }
}
