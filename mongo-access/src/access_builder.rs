use crate::access_config::{AccessConfig, UpdateValueMode};
use crate::errors::MongoAccessResult;
use crate::mongo_access::MongoAccess;

/// Builder for a [`MongoAccess`].
///
/// # Examples
///
/// ```rust
/// use mongo_access::{MongoAccess, UpdateValueMode};
///
/// let access = MongoAccess::builder()
///     .connection_string("mongodb://localhost/test")
///     .last_modified_field("updatedAt")
///     .update_value_mode(UpdateValueMode::Stringify)
///     .worker_threads(2)
///     .build()
///     .unwrap();
///
/// assert_eq!(access.config().last_modified_field(), "updatedAt");
/// ```
pub struct MongoAccessBuilder {
    config: AccessConfig,
}

impl MongoAccessBuilder {
    pub fn new() -> Self {
        MongoAccessBuilder {
            config: AccessConfig::new(""),
        }
    }

    /// Sets the connection string used for every database this access object
    /// opens. Required.
    pub fn connection_string(mut self, connection_string: &str) -> Self {
        self.config.set_connection_string(connection_string);
        self
    }

    /// Sets the field stamped with the server time on every update.
    /// Defaults to `lastModified`.
    pub fn last_modified_field(mut self, field: &str) -> Self {
        self.config.set_last_modified_field(field);
        self
    }

    pub fn update_value_mode(mut self, mode: UpdateValueMode) -> Self {
        self.config.set_update_value_mode(mode);
        self
    }

    /// Shorthand for `update_value_mode(UpdateValueMode::Stringify)`.
    pub fn stringify_update_values(self) -> Self {
        self.update_value_mode(UpdateValueMode::Stringify)
    }

    /// Sets the worker count of the runtime behind the blocking API.
    /// Defaults to the number of available CPU cores.
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.set_worker_threads(count);
        self
    }

    pub fn thread_name(mut self, name: &str) -> Self {
        self.config.set_thread_name(name);
        self
    }

    /// Validates the settings and creates the access object. Nothing is
    /// connected yet.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the settings are invalid.
    pub fn build(self) -> MongoAccessResult<MongoAccess> {
        self.config.validate()?;
        log::debug!(
            "Creating mongo access with {:?} update values",
            self.config.update_value_mode()
        );
        Ok(MongoAccess::from_config(self.config))
    }
}

impl Default for MongoAccessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_build_with_defaults() {
        let access = MongoAccessBuilder::new()
            .connection_string("mongodb://localhost/test")
            .build()
            .unwrap();
        assert_eq!(access.config().connection_string(), "mongodb://localhost/test");
        assert_eq!(access.config().last_modified_field(), "lastModified");
        assert_eq!(access.config().update_value_mode(), UpdateValueMode::Native);
        assert_eq!(access.cached_collection_count(), 0);
    }

    #[test]
    fn test_build_without_connection_string_fails() {
        let err = MongoAccessBuilder::default().build().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_new_with_empty_connection_string_fails() {
        assert!(MongoAccess::new("").is_err());
    }

    #[test]
    fn test_custom_settings() {
        let access = MongoAccessBuilder::new()
            .connection_string("mongodb://db.internal:27017")
            .last_modified_field("updatedAt")
            .stringify_update_values()
            .worker_threads(3)
            .thread_name("orders-io")
            .build()
            .unwrap();

        let config = access.config();
        assert_eq!(config.last_modified_field(), "updatedAt");
        assert_eq!(config.update_value_mode(), UpdateValueMode::Stringify);
        assert_eq!(config.worker_threads(), 3);
        assert_eq!(config.thread_name(), "orders-io");
    }

    #[test]
    fn test_zero_worker_threads_fails() {
        let result = MongoAccessBuilder::new()
            .connection_string("mongodb://localhost/test")
            .worker_threads(0)
            .build();
        assert!(result.is_err());
    }
}
