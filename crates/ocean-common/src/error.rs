//! Error types for OceanDB query operations.

use thiserror::Error;

/// Result type alias using OceanError.
pub type OceanResult<T> = Result<T, OceanError>;

/// Primary error type for OceanDB operations.
#[derive(Debug, Error)]
pub enum OceanError {
    // === Caller Contract Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Input arrays must have equal length: {field} has {actual} elements, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown mission code: {0}")]
    UnknownMission(String),

    // === Schema Errors ===
    #[error("Field '{field}' is not defined in schema '{schema}'")]
    UnknownField { schema: String, field: String },

    #[error("Requested field '{0}' is not present in the result rows")]
    MissingColumn(String),

    #[error("Failed to decode field '{field}' at row {row}: {message}")]
    DecodeError {
        field: String,
        row: usize,
        message: String,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Dataset '{0}' already exists in this container")]
    DuplicateDataset(String),

    // === Batch Protocol Errors ===
    #[error("Invalid query template: {0}")]
    TemplateError(String),

    #[error("Batch result misaligned: {0}")]
    BatchMisaligned(String),

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Basin data error: {0}")]
    BasinDataError(String),

    #[error("NetCDF error: {0}")]
    NetCdfError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OceanError {
    /// Shorthand for an [`OceanError::InvalidParameter`].
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`OceanError::DecodeError`].
    pub fn decode(field: impl Into<String>, row: usize, message: impl Into<String>) -> Self {
        Self::DecodeError {
            field: field.into(),
            row,
            message: message.into(),
        }
    }

    /// True when the error is a violation of the caller's contract
    /// (bad inputs or a schema/query mismatch) rather than a store failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            OceanError::MissingParameter(_)
                | OceanError::InvalidParameter { .. }
                | OceanError::LengthMismatch { .. }
                | OceanError::UnknownMission(_)
                | OceanError::UnknownField { .. }
                | OceanError::MissingColumn(_)
                | OceanError::DecodeError { .. }
                | OceanError::TemplateError(_)
        )
    }

    /// Short machine-readable code, used in structured log output.
    pub fn code(&self) -> &'static str {
        match self {
            OceanError::MissingParameter(_) => "missing_parameter",
            OceanError::InvalidParameter { .. } => "invalid_parameter",
            OceanError::LengthMismatch { .. } => "length_mismatch",
            OceanError::UnknownMission(_) => "unknown_mission",
            OceanError::UnknownField { .. } => "unknown_field",
            OceanError::MissingColumn(_) => "missing_column",
            OceanError::DecodeError { .. } => "decode_error",
            OceanError::InvalidSchema(_) => "invalid_schema",
            OceanError::DuplicateDataset(_) => "duplicate_dataset",
            OceanError::TemplateError(_) => "template_error",
            OceanError::BatchMisaligned(_) => "batch_misaligned",
            OceanError::DatabaseError(_) => "database_error",
            OceanError::BasinDataError(_) => "basin_data_error",
            OceanError::NetCdfError(_) => "netcdf_error",
            OceanError::ConfigError(_) => "config_error",
            OceanError::Io(_) => "io_error",
        }
    }
}

impl From<serde_json::Error> for OceanError {
    fn from(err: serde_json::Error) -> Self {
        OceanError::ConfigError(format!("JSON error: {}", err))
    }
}
