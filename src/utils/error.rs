use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {message}")]
    ApiStatusError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Resource already exists: {resource}")]
    AlreadyExistsError { resource: String },

    #[error("Resource not found: {resource}")]
    NotFoundError { resource: String },

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("Token signing failed: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Model error: {message}")]
    ModelError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Stage '{stage}' failed: {details}")]
    StageError { stage: String, details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Authentication,
    Input,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::ApiError(_) => ErrorCategory::Network,
            SyncError::ApiStatusError { .. }
            | SyncError::AlreadyExistsError { .. }
            | SyncError::NotFoundError { .. } => ErrorCategory::Remote,
            SyncError::AuthError { .. } | SyncError::TokenError(_) => {
                ErrorCategory::Authentication
            }
            SyncError::IoError(_)
            | SyncError::SerializationError(_)
            | SyncError::ModelError { .. } => ErrorCategory::Input,
            SyncError::ConfigError { .. }
            | SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SyncError::StageError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::AlreadyExistsError { .. } | SyncError::NotFoundError { .. } => {
                ErrorSeverity::Low
            }
            SyncError::ApiError(_) | SyncError::ApiStatusError { .. } => ErrorSeverity::Medium,
            SyncError::ModelError { .. }
            | SyncError::SerializationError(_)
            | SyncError::StageError { .. } => ErrorSeverity::High,
            SyncError::AuthError { .. }
            | SyncError::TokenError(_)
            | SyncError::IoError(_)
            | SyncError::ConfigError { .. }
            | SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the configured service endpoints",
            ErrorCategory::Remote => {
                "Inspect the service response; check project/provider ids and API enablement"
            }
            ErrorCategory::Authentication => {
                "Verify the bearer token or the service account key and its roles"
            }
            ErrorCategory::Input => "Make sure the model file exists and is a valid OptimizeToursRequest JSON",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Processing => "Run with --verbose to see which call failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::ApiError(_) => "Could not reach a remote service".to_string(),
            SyncError::ApiStatusError { service, status, .. } => {
                format!("{} rejected the request (HTTP {})", service, status)
            }
            SyncError::AuthError { .. } | SyncError::TokenError(_) => {
                "Could not obtain an access token".to_string()
            }
            SyncError::IoError(_) => "Could not read or write a local file".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, SyncError::AlreadyExistsError { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFoundError { .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
