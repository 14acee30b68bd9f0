//! Error handling for varcore
//!
//! Two layers of errors live here:
//!
//! - [`AccessError`] is the accessor taxonomy. Every read, write and
//!   min/max call returns one of these as a plain value; success is `Ok`.
//!   It is `Copy` so callers can compare and store codes freely.
//! - [`VarCoreError`] is the crate-level error used while loading and
//!   validating generated tables, with a [`Result`] alias and a
//!   [`ResultExt`] trait for attaching context.

use thiserror::Error;

/// Base value of the numeric error codes shared with generated firmware tables
pub const ERR_BASE: i32 = 0x2000;

/// Errors returned by the accessor engine
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessError {
    /// Unspecified failure
    #[error("generic failure")]
    Generic,

    /// Write rejected because the value is above the variable's maximum
    #[error("value above upper limit")]
    UpperLimit,

    /// Write rejected because the value is below the variable's minimum
    #[error("value below lower limit")]
    LowerLimit,

    /// Channel addressing on a scalar variable
    #[error("variable is not a vector")]
    NotVector,

    /// Channel outside the vector, or outside the backing array
    #[error("invalid channel")]
    InvalidChannel,

    /// Capability check failed, or write to a constant string
    #[error("access denied")]
    AccessDenied,

    /// Text could not be converted to the variable's native type
    #[error("invalid value")]
    InvalidValue,

    /// Accessor type does not match the variable's declared type
    #[error("invalid type")]
    InvalidType,

    /// Value is not a member of the variable's enumeration
    #[error("invalid enum value")]
    InvalidEnum,

    /// Text does not fit into a string cell
    #[error("size too big")]
    SizeTooBig,

    /// Missing or undersized caller buffer
    #[error("invalid argument")]
    InvalidArgument,

    /// Handle outside the registry directory
    #[error("unknown handle")]
    UnknownHandle,
}

impl AccessError {
    /// Numeric error code, compatible with the firmware `ERR_*` values
    pub fn code(self) -> i32 {
        match self {
            AccessError::Generic => -1,
            AccessError::UpperLimit => ERR_BASE + 1,
            AccessError::LowerLimit => ERR_BASE + 2,
            AccessError::NotVector => ERR_BASE + 3,
            AccessError::InvalidChannel => ERR_BASE + 4,
            AccessError::AccessDenied => ERR_BASE + 5,
            AccessError::InvalidValue => ERR_BASE + 6,
            AccessError::InvalidType => ERR_BASE + 7,
            AccessError::InvalidEnum => ERR_BASE + 8,
            AccessError::SizeTooBig => ERR_BASE + 9,
            AccessError::InvalidArgument => ERR_BASE + 10,
            AccessError::UnknownHandle => ERR_BASE + 11,
        }
    }

    /// Inverse of [`AccessError::code`]
    pub fn from_code(code: i32) -> Option<Self> {
        const ALL: [AccessError; 12] = [
            AccessError::Generic,
            AccessError::UpperLimit,
            AccessError::LowerLimit,
            AccessError::NotVector,
            AccessError::InvalidChannel,
            AccessError::AccessDenied,
            AccessError::InvalidValue,
            AccessError::InvalidType,
            AccessError::InvalidEnum,
            AccessError::SizeTooBig,
            AccessError::InvalidArgument,
            AccessError::UnknownHandle,
        ];
        ALL.into_iter().find(|e| e.code() == code)
    }
}

/// Result type alias for accessor calls
pub type AccessResult<T> = std::result::Result<T, AccessError>;

/// Main error type for varcore operations outside the accessor hot path
#[derive(Error, Debug)]
pub enum VarCoreError {
    /// An accessor call failed
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    /// Generated tables are inconsistent
    #[error("Table error: {0}")]
    Table(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<VarCoreError>,
    },
}

impl VarCoreError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        VarCoreError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a table error for a specific variable
    pub fn table(hnd: usize, message: impl std::fmt::Display) -> Self {
        VarCoreError::Table(format!("variable #{}: {}", hnd, message))
    }
}

/// Result type alias for varcore operations
pub type Result<T> = std::result::Result<T, VarCoreError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for AccessResult<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| VarCoreError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| VarCoreError::from(e).with_context(f()))
    }
}
