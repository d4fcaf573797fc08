//! Error types for load-test support operations.
//!
//! HTTP-level failures are *not* errors here: a 404 or a persistent 503 is a
//! normal [`RequestOutcome`](crate::http::RequestOutcome) that the driver
//! asserts on. [`LoadError`] only covers what a driver cannot sensibly
//! assert on:
//! - Configuration errors (missing scoping identifiers, invalid budgets)
//! - Unrecoverable transport failures (malformed target URL)
//! - Collection-fatal failures while following a pagination cursor
//! - Iterations stopped on a failed check
//! - Report sink failures
//!
//! # Example
//!
//! ```rust
//! use loadkit::{LoadError, LoadResult};
//! use loadkit::error::ErrorCategory;
//!
//! fn classify(err: &LoadError) -> &'static str {
//!     match err.category() {
//!         ErrorCategory::Client => "fix the driver",
//!         ErrorCategory::External => "platform misbehaved",
//!         _ => "investigate",
//!     }
//! }
//! ```

use crate::logging::{log_error, log_warn};
use thiserror::Error;

// ============================================================================
// Error categorization types
// ============================================================================

/// High-level categorization of errors for routing and handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A check failed and the driver chose to stop the iteration.
    BusinessLogic,

    /// The platform under test returned something unusable.
    External,

    /// Local I/O or other failures inside the test process.
    Internal,

    /// The driver supplied an invalid configuration or target.
    Client,
}

/// Severity level for logging and alerting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The run cannot produce a trustworthy result.
    Critical,

    /// Action failed but the run can continue with the next iteration.
    Error,

    /// Unexpected but recoverable.
    Warning,

    /// Expected failure, normal operation.
    Info,
}

// ============================================================================
// Load error types
// ============================================================================

/// Convenient result type for load-test support operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while driving platform APIs.
///
/// | Variant | Category | Severity |
/// |---------|----------|----------|
/// | `ConfigurationError` | Client | Error |
/// | `InvalidTarget` | Client | Error |
/// | `TransportFailed` | Internal | Error |
/// | `CollectionFailed` | External | Error |
/// | `PageDecode` | External | Error |
/// | `IterationStopped` | BusinessLogic | Warning |
/// | `ReportWrite` | Internal | Critical |
#[derive(Error, Debug)]
pub enum LoadError {
    /// Run configuration is invalid or incomplete.
    #[error("Load test configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The target of a request could not be turned into a request at all.
    #[error("Invalid request target '{url}': {message}")]
    InvalidTarget {
        /// The offending URL as supplied by the caller.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// The HTTP stack failed in a way that is not a missing response.
    #[error("Transport failed: {message}")]
    TransportFailed {
        /// Description of the failure.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A list page came back with a non-2xx status after all retries.
    #[error("Collection aborted: {url} returned status {status} on page {page}")]
    CollectionFailed {
        /// URL of the page that failed.
        url: String,
        /// Final status code observed (0 when no response was obtained).
        status: u16,
        /// One-based page number.
        page: usize,
    },

    /// A list page body did not have the expected shape.
    #[error("Collection page {page} could not be decoded: {message}")]
    PageDecode {
        /// One-based page number.
        page: usize,
        /// Decoder message.
        message: String,
    },

    /// A driver check failed and the iteration must not continue.
    #[error("Iteration stopped: {message}")]
    IterationStopped {
        /// Driver-supplied description of the failed step.
        message: String,
        /// Status of the request that failed the check, if any.
        status: Option<u16>,
    },

    /// The report document could not be written to the sink.
    #[error("Report could not be written to {path}: {source}")]
    ReportWrite {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Get the error category for routing and handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. } | Self::InvalidTarget { .. } => ErrorCategory::Client,
            Self::CollectionFailed { .. } | Self::PageDecode { .. } => ErrorCategory::External,
            Self::TransportFailed { .. } | Self::ReportWrite { .. } => ErrorCategory::Internal,
            Self::IterationStopped { .. } => ErrorCategory::BusinessLogic,
        }
    }

    /// Get the error severity for logging and alerting.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::Error,
            Self::InvalidTarget { .. } => ErrorSeverity::Error,
            Self::TransportFailed { .. } => ErrorSeverity::Error,
            Self::CollectionFailed { .. } => ErrorSeverity::Error,
            Self::PageDecode { .. } => ErrorSeverity::Error,
            Self::IterationStopped { .. } => ErrorSeverity::Warning,
            Self::ReportWrite { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether the enclosing iteration must be abandoned.
    ///
    /// Everything except configuration problems and report-sink failures
    /// ends the iteration; those two end the whole run.
    pub fn stops_iteration(&self) -> bool {
        !matches!(self, Self::ConfigurationError { .. } | Self::ReportWrite { .. })
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Load test configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn invalid_target(url: impl Into<String>, message: impl Into<String>) -> Self {
        let url = url.into();
        let message = message.into();
        log_error!(
            error_type = "invalid_target",
            url = %url,
            message = %message,
            "Request target rejected"
        );
        Self::InvalidTarget { url, message }
    }

    pub fn transport_failed(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_error!(
            error_type = "transport_failed",
            message = %message,
            has_source = source.is_some(),
            "HTTP transport failed"
        );
        Self::TransportFailed { message, source }
    }

    pub fn collection_failed(url: impl Into<String>, status: u16, page: usize) -> Self {
        let url = url.into();
        log_error!(
            error_type = "collection_failed",
            url = %url,
            status = status,
            page = page,
            "Paginated collection aborted on non-success page"
        );
        Self::CollectionFailed { url, status, page }
    }

    pub fn page_decode(page: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "page_decode",
            page = page,
            message = %message,
            "Collection page body has unexpected shape"
        );
        Self::PageDecode { page, message }
    }

    pub fn iteration_stopped(message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "iteration_stopped",
            message = %message,
            status = ?status,
            "Iteration stopped on failed check"
        );
        Self::IterationStopped { message, status }
    }

    pub fn report_write(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        log_error!(
            error_type = "report_write",
            path = %path,
            error = %source,
            "Failed to write report document"
        );
        Self::ReportWrite { path, source }
    }
}
