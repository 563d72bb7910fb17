use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for mongo_access operations.
///
/// Only configuration and runtime failures originate here. Everything else
/// comes from the driver.
///
/// # Examples
///
/// ```rust
/// use mongo_access::errors::{ErrorKind, MongoAccessError, MongoAccessResult};
///
/// fn example() -> MongoAccessResult<()> {
///     Err(MongoAccessError::new("collection name is empty", ErrorKind::ConfigurationError))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::ConfigurationError);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Entity mapping metadata is missing or incomplete, or the access
    /// object was built with invalid settings.
    ConfigurationError,
    /// A failure reported by the MongoDB driver. The driver error is kept
    /// unchanged as the cause.
    DriverError,
    /// The blocking runtime could not be created, or a blocking call was made
    /// from inside an async runtime.
    RuntimeError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::DriverError => write!(f, "Driver error"),
            ErrorKind::RuntimeError => write!(f, "Runtime error"),
        }
    }
}

/// Error type for all mongo_access operations.
///
/// Driver failures keep the original [`mongodb::error::Error`], reachable
/// through [`MongoAccessError::driver_error`] and [`Error::source`], so callers
/// can still inspect error labels, write errors and the like.
#[derive(Clone)]
pub struct MongoAccessError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<mongodb::error::Error>,
    backtrace: Backtrace,
}

impl MongoAccessError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MongoAccessError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Wraps a driver error without altering it.
    pub fn from_driver(cause: mongodb::error::Error) -> Self {
        MongoAccessError {
            message: cause.to_string(),
            error_kind: ErrorKind::DriverError,
            cause: Some(cause),
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    /// The untouched driver error, if this error came from the driver.
    pub fn driver_error(&self) -> Option<&mongodb::error::Error> {
        self.cause.as_ref()
    }

    pub fn is_configuration_error(&self) -> bool {
        self.error_kind == ErrorKind::ConfigurationError
    }
}

impl Display for MongoAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MongoAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => write!(f, "{}: {}\n{:?}", self.error_kind, self.message, self.backtrace),
        }
    }
}

impl Error for MongoAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, MongoAccessError>`.
pub type MongoAccessResult<T> = Result<T, MongoAccessError>;

impl From<mongodb::error::Error> for MongoAccessError {
    fn from(err: mongodb::error::Error) -> Self {
        MongoAccessError::from_driver(err)
    }
}

impl From<std::io::Error> for MongoAccessError {
    fn from(err: std::io::Error) -> Self {
        MongoAccessError::new(
            &format!("Failed to start blocking runtime: {}", err),
            ErrorKind::RuntimeError,
        )
    }
}
