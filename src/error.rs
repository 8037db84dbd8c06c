use crate::query_builder::Dialect;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

/// Broad category of a [`QueryError`]
///
/// Specification errors mean the caller's input is wrong and would be wrong
/// on any dialect. Dialect capability errors mean the input is fine but the
/// selected dialect cannot express it. Execution errors come from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Specification,
    DialectCapability,
    Execution,
}

/// Main error type for query building and execution
#[derive(Error, Debug)]
pub enum QueryError {
    // Where/update specification errors
    #[error("[builder] couldn't split an empty key")]
    EmptyKey,

    #[error("[builder] unsupported operator: {0:?}")]
    UnsupportedOperator(String),

    #[error("[builder] the value of \"{operator}\" must be a sequence")]
    ListValueType { operator: String },

    #[error("[builder] the value of \"{operator}\" must be a single value")]
    ScalarValueType { operator: String },

    #[error("[builder] the value of \"{operator}\" must contain at least one element")]
    EmptyList { operator: String },

    #[error("[builder] the value of \"_or\" must be a sequence of where specs")]
    OrValueType,

    #[error("[builder] every \"_or\" alternative must contain at least one condition")]
    EmptyOrAlternative,

    #[error("[builder] the value of \"_orderby\" must be a string")]
    OrderByValueType,

    #[error("[builder] the value of \"_orderby\" contains invalid expression: {0:?}")]
    OrderByValueInvalid(String),

    #[error("[builder] the value of \"_groupby\" must be a string")]
    GroupByValueType,

    #[error("[builder] the value of \"_groupby\" contains invalid expression: {0:?}")]
    GroupByValueInvalid(String),

    #[error("[builder] the value of \"_having\" must be a where spec")]
    HavingValueType,

    #[error("[builder] \"_having\" contains unsupported operator: {0:?}")]
    HavingUnsupportedOperator(String),

    #[error("[builder] \"_having\" requires a non-empty \"_groupby\"")]
    HavingWithoutGroupBy,

    #[error("[builder] the value of \"_limit\" must be a non-negative integer or a sequence of one or two")]
    LimitValueType,

    #[error("[builder] the value of \"_limit\" must contain one or two elements")]
    LimitValueLength,

    #[error("[builder] \"_limit\" with offset is only supported in SELECT queries")]
    LimitOffsetNotSupported,

    #[error("[builder] the value of \"_lockMode\" must be a string")]
    LockModeValueType,

    #[error("[builder] the value of \"_lockMode\" is not allowed: {0:?}")]
    NotAllowedLockMode(String),

    #[error("[builder] the value of \"{0}\" must be a condition")]
    CustomValueType(String),

    #[error("[builder] \"{0}\" is not a valid key here")]
    InvalidKey(String),

    #[error("[builder] update set cannot be empty")]
    EmptyUpdate,

    #[error("[builder] the value of update field \"{0}\" must be a single value")]
    UpdateValueType(String),

    #[error("[builder] insert null data")]
    InsertNullData,

    #[error("[builder] insert data not match: row {row} differs from the first row at field {field:?}")]
    InsertDataMismatch { row: usize, field: String },

    #[error("[builder] named parameter {0:?} not found")]
    MissingNamedParameter(String),

    #[error("[builder] named parameter {0:?} must be a scalar or a non-empty sequence")]
    NamedParameterValue(String),

    #[error("[builder] aggregate symbol cannot be empty")]
    InvalidAggregate,

    #[error("[builder] json path cannot be empty")]
    InvalidJsonPath,

    // Dialect capability errors
    #[error("[builder] unsupported dialect: {0:?}")]
    UnsupportedDialect(String),

    #[error("[builder] feature is not supported for dialect: {feature} for {dialect}")]
    UnsupportedFeature {
        dialect: Dialect,
        feature: &'static str,
    },

    #[error("[builder] conflict columns cannot be empty")]
    EmptyConflictColumns,

    // Execution errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unsupported_feature(dialect: Dialect, feature: &'static str) -> Self {
        Self::UnsupportedFeature { dialect, feature }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedDialect(_)
            | Self::UnsupportedFeature { .. }
            | Self::EmptyConflictColumns => ErrorKind::DialectCapability,
            Self::Database(_) | Self::Config(_) => ErrorKind::Execution,
            _ => ErrorKind::Specification,
        }
    }

    /// True when retrying the same input on another dialect could succeed
    pub fn is_dialect_capability(&self) -> bool {
        self.kind() == ErrorKind::DialectCapability
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
