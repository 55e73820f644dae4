use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnimatchError {
    #[error("Row {row} of '{source_name}' could not be decoded: {message}")]
    ImportRowError {
        source_name: String,
        row: usize,
        message: String,
    },

    #[error("Score source '{source_name}' is unavailable: {message}")]
    ImportSourceError {
        source_name: String,
        message: String,
    },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Favorite write for '{program_code}' failed: {message}")]
    RemoteWriteFailure {
        program_code: String,
        message: String,
    },

    #[error("Favorites subscription for user '{user_id}' failed: {message}")]
    RemoteSubscriptionError { user_id: String, message: String },

    #[error("No active session")]
    NoSession,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Import,
    Query,
    Remote,
    Session,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UnimatchError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ImportRowError { .. } | Self::ImportSourceError { .. } => ErrorCategory::Import,
            Self::InvalidQuery { .. } => ErrorCategory::Query,
            Self::RemoteWriteFailure { .. } | Self::RemoteSubscriptionError { .. } => {
                ErrorCategory::Remote
            }
            Self::NoSession => ErrorCategory::Session,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// 嚴重程度：單列錯誤可忽略，遠端錯誤可重試，設定錯誤需要使用者介入
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ImportRowError { .. } => ErrorSeverity::Low,
            Self::RemoteWriteFailure { .. } | Self::RemoteSubscriptionError { .. } => {
                ErrorSeverity::Medium
            }
            Self::InvalidQuery { .. } | Self::NoSession | Self::ImportSourceError { .. } => {
                ErrorSeverity::High
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ImportRowError { source_name, .. } => {
                format!("Check the malformed row in '{}'; the rest of the file was loaded", source_name)
            }
            Self::ImportSourceError { source_name, .. } => format!(
                "Make sure '{}' exists under the data directory and is a readable CSV file",
                source_name
            ),
            Self::InvalidQuery { .. } => "Select an exam type before listing programs".to_string(),
            Self::RemoteWriteFailure { .. } => "Toggle the favorite again to retry".to_string(),
            Self::RemoteSubscriptionError { .. } => {
                "Sign in again to re-establish the favorites subscription".to_string()
            }
            Self::NoSession => "Sign in (pass --user) before managing favorites".to_string(),
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Check the configuration file syntax and values".to_string()
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the configuration", field)
            }
            Self::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
            Self::IoError(_) => "Check file permissions and available disk space".to_string(),
            Self::SerializationError(_) => {
                "The favorites file may be corrupted; move it aside and retry".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ImportSourceError { .. } => "No score data is available right now".to_string(),
            Self::RemoteWriteFailure { .. } => "Your favorite could not be saved".to_string(),
            Self::RemoteSubscriptionError { .. } => "Favorites could not be synchronized".to_string(),
            Self::NoSession => "You need to be signed in to use favorites".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UnimatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_errors_are_low_severity() {
        let err = UnimatchError::ImportRowError {
            source_name: "tyt.csv".to_string(),
            row: 7,
            message: "invalid utf-8".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Import);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.to_string().contains("Row 7"));
    }

    #[test]
    fn test_remote_errors_are_retryable() {
        let err = UnimatchError::RemoteWriteFailure {
            program_code: "101110".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.user_friendly_message(), "Your favorite could not be saved");
    }

    #[test]
    fn test_invalid_query_message() {
        let err = UnimatchError::invalid_query("exam type is required");
        assert_eq!(err.to_string(), "Invalid query: exam type is required");
        assert_eq!(err.category(), ErrorCategory::Query);
    }
}
