use crate::errors::{ErrorKind, MongoAccessError, MongoAccessResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;

/// A record type that is stored in a MongoDB collection.
///
/// # Purpose
/// Attaches the (database, collection) pair to a type so that handles can be
/// resolved from the type alone. Implemented by the `CollectionEntity` derive
/// macro or by hand.
///
/// # Characteristics
/// - Metadata is read lazily on first access, never eagerly
/// - `None` or an empty name fails resolution with a configuration error
/// - The serde bounds are the ones the driver needs to write and read `T`
///
/// # Usage
/// ```ignore
/// #[derive(Serialize, Deserialize, CollectionEntity)]
/// #[mapping(database = "shop", collection = "orders")]
/// pub struct Order {
///     #[serde(rename = "_id")]
///     id: ObjectId,
///     status: String,
/// }
///
/// // Explicit mapping without the derive
/// impl CollectionEntity for Invoice {
///     fn mapping_information() -> Option<MappingInformation> {
///         Some(MappingInformation::new("billing", "invoices"))
///     }
/// }
/// ```
pub trait CollectionEntity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Returns the mapping metadata of this type, if any was declared.
    fn mapping_information() -> Option<MappingInformation>;
}

/// Database and collection names an entity type is mapped to.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct MappingInformation {
    database_name: String,
    collection_name: String,
}

impl MappingInformation {
    pub fn new(database_name: impl Into<String>, collection_name: impl Into<String>) -> Self {
        MappingInformation {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

/// Reads and validates the mapping metadata of `T`.
///
/// # Errors
///
/// Returns a `ConfigurationError` if `T` declares no mapping, or if either
/// name is empty.
pub(crate) fn mapping_of<T: CollectionEntity>() -> MongoAccessResult<MappingInformation> {
    let entity = type_name::<T>();
    let mapping = match T::mapping_information() {
        Some(mapping) => mapping,
        None => {
            log::error!("No mapping information found for entity {}", entity);
            return Err(MongoAccessError::new(
                &format!("No mapping information found for entity {}", entity),
                ErrorKind::ConfigurationError,
            ));
        }
    };

    if mapping.database_name.trim().is_empty() {
        log::error!("Database name is empty for entity {}", entity);
        return Err(MongoAccessError::new(
            &format!("Database name is empty for entity {}", entity),
            ErrorKind::ConfigurationError,
        ));
    }

    if mapping.collection_name.trim().is_empty() {
        log::error!("Collection name is empty for entity {}", entity);
        return Err(MongoAccessError::new(
            &format!("Collection name is empty for entity {}", entity),
            ErrorKind::ConfigurationError,
        ));
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Mapped;

    impl CollectionEntity for Mapped {
        fn mapping_information() -> Option<MappingInformation> {
            Some(MappingInformation::new("shop", "orders"))
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Unmapped;

    impl CollectionEntity for Unmapped {
        fn mapping_information() -> Option<MappingInformation> {
            None
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct NoDatabase;

    impl CollectionEntity for NoDatabase {
        fn mapping_information() -> Option<MappingInformation> {
            Some(MappingInformation::new("", "orders"))
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct BlankCollection;

    impl CollectionEntity for BlankCollection {
        fn mapping_information() -> Option<MappingInformation> {
            Some(MappingInformation::new("shop", "  "))
        }
    }

    #[test]
    fn test_mapping_of_valid_entity() {
        let mapping = mapping_of::<Mapped>().unwrap();
        assert_eq!(mapping.database_name(), "shop");
        assert_eq!(mapping.collection_name(), "orders");
    }

    #[test]
    fn test_mapping_of_unmapped_entity() {
        let err = mapping_of::<Unmapped>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("No mapping information"));
        assert!(err.message().contains("Unmapped"));
    }

    #[test]
    fn test_mapping_of_empty_database() {
        let err = mapping_of::<NoDatabase>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("Database name is empty"));
    }

    #[test]
    fn test_mapping_of_blank_collection() {
        let err = mapping_of::<BlankCollection>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("Collection name is empty"));
    }

    #[test]
    fn test_mapping_information_equality() {
        let a = MappingInformation::new("shop", "orders");
        let b = MappingInformation::new(String::from("shop"), String::from("orders"));
        assert_eq!(a, b);
        assert_ne!(a, MappingInformation::new("shop", "carts"));
    }
}
