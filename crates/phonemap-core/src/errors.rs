//! Error taxonomy shared by the store, generator, import pipeline and enrollment.

use rusqlite::ErrorCode;

/// Mapping store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Storage cannot be reached (open failure, busy/locked, IO).
    #[error("storage unavailable: {message}")]
    Connection { message: String },

    /// A `real_phone` or `fake_phone` already exists.
    #[error("uniqueness constraint violated: {message}")]
    ConstraintViolation { message: String },

    /// Any other SQLite failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        let message = e.to_string();
        match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::ConstraintViolation { message },
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase
                | ErrorCode::PermissionDenied
                | ErrorCode::DiskFull
                | ErrorCode::FileLockingProtocolFailed,
            ) => StoreError::Connection { message },
            _ => StoreError::Database(message),
        }
    }
}

/// Fake number generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Every attempt collided with the known set.
    #[error("could not generate a unique number after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("invalid fake number spec: {reason}")]
    InvalidSpec { reason: String },
}

/// Which column of an inbox row an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneColumn {
    Real,
    Fake,
}

impl PhoneColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneColumn::Real => "real_phone",
            PhoneColumn::Fake => "fake_phone",
        }
    }
}

impl std::fmt::Display for PhoneColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import cycle errors. Any of these aborts the cycle before storage is touched,
/// except `Store`, which is raised by the transactional replace itself.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("file too large: {size} bytes > {max}")]
    FileTooLarge { size: u64, max: u64 },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file is empty")]
    Empty,

    #[error("no data rows after header")]
    NoDataRows,

    #[error("not enough columns on line {line}")]
    MissingColumns { line: usize },

    #[error("blank value on line {line}")]
    BlankValue { line: usize },

    #[error("invalid {column} on line {line}: {raw}")]
    InvalidPhone {
        column: PhoneColumn,
        line: usize,
        raw: String,
    },

    #[error("duplicate {column} '{phone}' on line {line}")]
    DuplicatePhone {
        column: PhoneColumn,
        line: usize,
        phone: String,
    },

    #[error("malformed CSV on line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("database write failed: {0}")]
    Store(#[from] StoreError),

    #[error("import panicked: {message}")]
    Panicked { message: String },
}

impl ImportError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ImportError::Io {
            context: context.into(),
            source,
        }
    }

    /// File line the error points at, for row-level failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            ImportError::MissingColumns { line }
            | ImportError::BlankValue { line }
            | ImportError::InvalidPhone { line, .. }
            | ImportError::DuplicatePhone { line, .. }
            | ImportError::Csv { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Enrollment (upload path) errors.
#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error("no valid phone numbers found")]
    NoValidPhones,

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
