use crate::entity::{mapping_of, CollectionEntity, MappingInformation};
use crate::errors::{MongoAccessError, MongoAccessResult};
use crate::runtime::BlockingRuntime;
use dashmap::DashMap;
use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};
use std::any::{type_name, TypeId};

/// Handle cache and connection registry of one access object.
///
/// Collection handles are keyed by entity type and databases by name. Both
/// maps only ever grow, and entries are inserted through the map's entry API
/// so that racing first-time resolutions agree on a single handle. The client
/// is always created on the owned [`BlockingRuntime`], whatever runtime the
/// first resolution comes from.
pub(crate) struct CollectionRegistry {
    connection_string: String,
    client: tokio::sync::OnceCell<Client>,
    databases: DashMap<String, Database>,
    collections: DashMap<TypeId, Collection<Document>>,
}

impl CollectionRegistry {
    pub(crate) fn new(connection_string: &str) -> Self {
        CollectionRegistry {
            connection_string: connection_string.to_string(),
            client: tokio::sync::OnceCell::new(),
            databases: DashMap::new(),
            collections: DashMap::new(),
        }
    }

    /// Returns the cached handle of `T`, without touching the driver.
    pub(crate) fn cached<T: CollectionEntity>(&self) -> Option<Collection<T>> {
        self.collections
            .get(&TypeId::of::<T>())
            .map(|collection| collection.clone_with_type::<T>())
    }

    pub(crate) fn has_collection<T: CollectionEntity>(&self) -> bool {
        self.collections.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub(crate) fn has_database(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    /// Drops every cached handle and the client.
    pub(crate) fn clear(&mut self) {
        self.collections.clear();
        self.databases.clear();
        self.client.take();
    }

    /// Resolves the handle of `T`, opening the client and database on a miss.
    pub(crate) async fn resolve<T: CollectionEntity>(
        &self,
        runtime: &BlockingRuntime,
    ) -> MongoAccessResult<Collection<T>> {
        if let Some(collection) = self.cached::<T>() {
            return Ok(collection);
        }
        let mapping = mapping_of::<T>()?;
        self.open::<T>(&mapping, runtime).await
    }

    /// Opens the handle of `T` for an already validated mapping and caches it
    /// unless another caller got there first.
    pub(crate) async fn open<T: CollectionEntity>(
        &self,
        mapping: &MappingInformation,
        runtime: &BlockingRuntime,
    ) -> MongoAccessResult<Collection<T>> {
        let database = self.database(mapping.database_name(), runtime).await?;
        let collection = database.collection::<Document>(mapping.collection_name());

        let cached = self
            .collections
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                log::debug!(
                    "Caching collection {}.{} for entity {}",
                    mapping.database_name(),
                    mapping.collection_name(),
                    type_name::<T>()
                );
                collection
            })
            .clone_with_type::<T>();
        Ok(cached)
    }

    async fn database(&self, name: &str, runtime: &BlockingRuntime) -> MongoAccessResult<Database> {
        let existing = self.databases.get(name).map(|database| database.clone());
        if let Some(database) = existing {
            return Ok(database);
        }

        let client = self.client(runtime).await?;
        let database = self
            .databases
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Opening database {}", name);
                client.database(name)
            })
            .clone();
        Ok(database)
    }

    async fn client(&self, runtime: &BlockingRuntime) -> MongoAccessResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                log::debug!("Creating MongoDB client");
                // server monitors run on the runtime the client is created on
                let uri = self.connection_string.clone();
                runtime
                    .run_owned(async move { Client::with_uri_str(uri).await })
                    .await?
                    .map_err(MongoAccessError::from)
            })
            .await
    }
}
