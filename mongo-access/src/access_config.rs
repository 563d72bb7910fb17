//! Configuration for [`MongoAccess`](crate::MongoAccess).

use crate::errors::{ErrorKind, MongoAccessError, MongoAccessResult};
use crate::get_cpu_count;

/// Default name of the field stamped with the server time on every update.
pub const DEFAULT_LAST_MODIFIED_FIELD: &str = "lastModified";

/// Default thread name of the blocking runtime workers.
pub const DEFAULT_THREAD_NAME: &str = "mongo-access-worker";

/// How values of a field/value update map are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateValueMode {
    /// Values keep their BSON type.
    #[default]
    Native,
    /// Every value is written as its string form. Numbers, dates and booleans
    /// lose their type; only use this to stay compatible with existing data.
    Stringify,
}

/// Settings shared by every handle an access object opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    connection_string: String,
    last_modified_field: String,
    update_value_mode: UpdateValueMode,
    worker_threads: usize,
    thread_name: String,
}

impl AccessConfig {
    /// Creates a configuration with default values for the given connection
    /// string. The string is not parsed here.
    pub fn new(connection_string: &str) -> Self {
        AccessConfig {
            connection_string: connection_string.to_string(),
            last_modified_field: DEFAULT_LAST_MODIFIED_FIELD.to_string(),
            update_value_mode: UpdateValueMode::default(),
            worker_threads: get_cpu_count(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn last_modified_field(&self) -> &str {
        &self.last_modified_field
    }

    pub fn update_value_mode(&self) -> UpdateValueMode {
        self.update_value_mode
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub(crate) fn set_connection_string(&mut self, connection_string: &str) {
        self.connection_string = connection_string.to_string();
    }

    pub(crate) fn set_last_modified_field(&mut self, field: &str) {
        self.last_modified_field = field.to_string();
    }

    pub(crate) fn set_update_value_mode(&mut self, mode: UpdateValueMode) {
        self.update_value_mode = mode;
    }

    pub(crate) fn set_worker_threads(&mut self, count: usize) {
        self.worker_threads = count;
    }

    pub(crate) fn set_thread_name(&mut self, name: &str) {
        self.thread_name = name.to_string();
    }

    /// Checks the settings that would otherwise fail much later, on first use.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an empty connection string, an empty
    /// last-modified field or a worker count of zero.
    pub fn validate(&self) -> MongoAccessResult<()> {
        if self.connection_string.trim().is_empty() {
            log::error!("Connection string cannot be empty");
            return Err(MongoAccessError::new(
                "Connection string cannot be empty",
                ErrorKind::ConfigurationError,
            ));
        }

        if self.last_modified_field.trim().is_empty() {
            log::error!("Last modified field name cannot be empty");
            return Err(MongoAccessError::new(
                "Last modified field name cannot be empty",
                ErrorKind::ConfigurationError,
            ));
        }

        if self.worker_threads == 0 {
            log::error!("Worker thread count must be greater than zero");
            return Err(MongoAccessError::new(
                "Worker thread count must be greater than zero",
                ErrorKind::ConfigurationError,
            ));
        }

        Ok(())
    }
}
