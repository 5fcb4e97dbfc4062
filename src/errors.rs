//! # Error Handling for Listing Navigation
//!
//! Errors raised by this crate are reserved for programmer-facing misuse: looking up a sort
//! option or filter that was never registered, fetching records without a bound record type,
//! or registering a malformed filter. Ordinary end-user input never produces an error; invalid
//! values are silently left out of the query instead.
//!
//! Failures from the data-access layer (`DbErr`) are wrapped without modification so callers
//! keep full control over recovery.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crudnav::{ErrorKind, NavigatorError};
//!
//! match ctx.sort_option("blabla") {
//!     Err(err) => assert_eq!(err.kind(), Some(ErrorKind::NoSuchSortOption)),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, NavigatorError>;

/// Kinds of misuse detected by the navigator.
///
/// Every kind carries a stable numeric code and its own message template. A `{}` in the
/// template is replaced by the subject of the error (a column or type name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Direct lookup of a sort column that was never registered
    NoSuchSortOption,
    /// The bound record type does not provide the configured count/find operations
    InvalidRecordType,
    /// Count or fetch attempted before a record type was bound
    NoTargetType,
    /// A filter was registered without the callable its variant requires
    InvalidFilterCallable,
    /// Direct lookup of a filter column that was never registered
    NoSuchFilter,
}

impl ErrorKind {
    /// Machine-checkable error code
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::NoSuchSortOption => 10,
            Self::InvalidRecordType => 20,
            Self::NoTargetType => 30,
            Self::InvalidFilterCallable => 40,
            Self::NoSuchFilter => 50,
        }
    }

    /// Message template for this kind
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::NoSuchSortOption => "Column \"{}\" is not among the sort options",
            Self::InvalidRecordType => "Type \"{}\" does not provide the record listing contract",
            Self::NoTargetType => "No record type configured for the listing",
            Self::InvalidFilterCallable => "Filter \"{}\" requires a callable",
            Self::NoSuchFilter => "Filter \"{}\" is not registered",
        }
    }

    fn render(self, subject: Option<&str>) -> String {
        let template = self.template();
        match subject {
            Some(subject) => template.replacen("{}", subject, 1),
            None => template.replacen("{}", "", 1),
        }
    }
}

/// Errors returned by the navigator
#[derive(Debug)]
pub enum NavigatorError {
    /// Programmer-facing misuse of the navigator API
    Misuse {
        /// What went wrong
        kind: ErrorKind,
        /// Column or type the error is about, substituted into the template
        subject: Option<String>,
    },

    /// Error from the data-access layer, passed through unmodified
    Database(DbErr),
}

impl NavigatorError {
    /// Create a misuse error about a specific column or type
    pub fn new(kind: ErrorKind, subject: impl Into<String>) -> Self {
        Self::Misuse {
            kind,
            subject: Some(subject.into()),
        }
    }

    /// Create a misuse error that has no subject
    #[must_use]
    pub const fn bare(kind: ErrorKind) -> Self {
        Self::Misuse {
            kind,
            subject: None,
        }
    }

    #[must_use]
    pub fn no_such_sort_option(column: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoSuchSortOption, column)
    }

    #[must_use]
    pub fn no_such_filter(column: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoSuchFilter, column)
    }

    #[must_use]
    pub fn invalid_filter_callable(column: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFilterCallable, column)
    }

    #[must_use]
    pub fn invalid_record_type(type_name: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRecordType, type_name)
    }

    #[must_use]
    pub const fn no_target_type() -> Self {
        Self::bare(ErrorKind::NoTargetType)
    }

    /// The misuse kind, or `None` for database errors
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Misuse { kind, .. } => Some(*kind),
            Self::Database(_) => None,
        }
    }

    /// Numeric code of the misuse kind, or `None` for database errors
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self.kind() {
            Some(kind) => Some(kind.code()),
            None => None,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Misuse { kind, subject } => kind.render(subject.as_deref()),
            Self::Database(_) => "A database error occurred".to_string(),
        }
    }

    /// Log internal error details (not sent to the client)
    fn log_internal(&self) {
        match self {
            Self::Database(internal) => {
                tracing::error!(error = ?internal, "Database error occurred while listing");
            }
            Self::Misuse { kind, .. } => {
                tracing::error!(
                    code = kind.code(),
                    error = %self.user_message(),
                    "Listing navigator misuse"
                );
            }
        }
    }
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(err) => write!(f, "{err}"),
            Self::Misuse { .. } => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for NavigatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            Self::Misuse { .. } => None,
        }
    }
}

impl From<DbErr> for NavigatorError {
    fn from(err: DbErr) -> Self {
        Self::Database(err)
    }
}

/// Error body sent to clients (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
}

impl IntoResponse for NavigatorError {
    fn into_response(self) -> Response {
        self.log_internal();

        // Misuse is a server-side bug, never the client's fault
        let body = match &self {
            Self::Database(_) => ErrorResponse {
                error: self.user_message(),
                code: None,
            },
            Self::Misuse { kind, .. } => ErrorResponse {
                error: "Listing is misconfigured".to_string(),
                code: Some(kind.code()),
            },
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
