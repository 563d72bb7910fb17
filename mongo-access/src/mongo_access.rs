use crate::access_builder::MongoAccessBuilder;
use crate::access_config::AccessConfig;
use crate::collection_registry::CollectionRegistry;
use crate::entity::{mapping_of, CollectionEntity};
use crate::errors::MongoAccessResult;
use crate::proxy::CollectionProxy;
use crate::runtime::BlockingRuntime;
use crate::update::UpdateBuilder;
use mongodb::bson::Document;
use mongodb::Collection;
use std::any::type_name;
use std::future::Future;
use std::sync::Arc;

/// Typed access to MongoDB collections.
///
/// Entity types carry their (database, collection) mapping through
/// [`CollectionEntity`]. The first access to a type resolves and caches its
/// collection handle; every later access reuses it. CRUD calls are forwarded
/// to the driver as they are.
///
/// Each operation comes in a blocking flavour, driven by a runtime the access
/// object starts on first use, and an `_async` flavour that runs on the
/// caller's tokio runtime. Blocking calls made from inside an async runtime
/// fail with a `RuntimeError`. The driver client always lives on the access
/// object's own runtime, so it keeps working after the runtime that first
/// resolved an entity has shut down.
///
/// Clones are cheap and share the handle cache, the connection registry and
/// the blocking runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use mongo_access::MongoAccess;
/// use mongodb::bson::doc;
///
/// let access = MongoAccess::new("mongodb://localhost/test")?;
///
/// access.insert_one(&order)?;
/// let done = access.update_many::<Order>(&doc! { "status": "done" }, doc! { "customer": "ada" })?;
/// let found = access.query(|orders: CollectionProxy<Order>| orders.find_by_id(order.id))??;
/// let removed = access.delete_many::<Order>(doc! { "status": "done" })?;
/// ```
#[derive(Clone)]
pub struct MongoAccess {
    inner: Arc<MongoAccessInner>,
}

impl MongoAccess {
    /// Creates an access object with default settings.
    ///
    /// The connection string is not parsed and no connection is made until
    /// the first entity is resolved.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an empty connection string.
    pub fn new(connection_string: &str) -> MongoAccessResult<MongoAccess> {
        MongoAccessBuilder::new()
            .connection_string(connection_string)
            .build()
    }

    /// Returns a builder for an access object with custom settings.
    pub fn builder() -> MongoAccessBuilder {
        MongoAccessBuilder::new()
    }

    pub(crate) fn from_config(config: AccessConfig) -> MongoAccess {
        MongoAccess {
            inner: Arc::new(MongoAccessInner::new(config)),
        }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.inner.config
    }

    /// Returns the collection handle of `T`, resolving and caching it on
    /// first use.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` if `T` has no mapping or an empty name
    /// - `DriverError` if the client cannot be created
    /// - `RuntimeError` if called from inside an async runtime on a cache miss
    pub fn resolve<T: CollectionEntity>(&self) -> MongoAccessResult<Collection<T>> {
        self.inner.resolve()
    }

    /// Async counterpart of [`MongoAccess::resolve`].
    pub async fn resolve_async<T: CollectionEntity>(&self) -> MongoAccessResult<Collection<T>> {
        self.inner.registry.resolve(&self.inner.runtime).await
    }

    /// Whether a handle for `T` is already cached.
    pub fn has_collection<T: CollectionEntity>(&self) -> bool {
        self.inner.registry.has_collection::<T>()
    }

    pub fn cached_collection_count(&self) -> usize {
        self.inner.registry.collection_count()
    }

    /// Whether the database `name` has been opened by this access object.
    pub fn has_database(&self, name: &str) -> bool {
        self.inner.registry.has_database(name)
    }

    pub fn insert_one<T: CollectionEntity>(&self, record: &T) -> MongoAccessResult<()> {
        let collection = self.inner.resolve::<T>()?;
        self.inner
            .runtime
            .block_on(insert_one(&collection, record))?
    }

    pub async fn insert_one_async<T: CollectionEntity>(&self, record: &T) -> MongoAccessResult<()> {
        let collection = self.resolve_async::<T>().await?;
        insert_one(&collection, record).await
    }

    /// Inserts all `records` in one driver call. Ordering and partial-failure
    /// behaviour are the driver's. An empty slice is a no-op.
    pub fn insert_many<T: CollectionEntity>(&self, records: &[T]) -> MongoAccessResult<()> {
        let collection = self.inner.resolve::<T>()?;
        self.inner
            .runtime
            .block_on(insert_many(&collection, records))?
    }

    pub async fn insert_many_async<T: CollectionEntity>(&self, records: &[T]) -> MongoAccessResult<()> {
        let collection = self.resolve_async::<T>().await?;
        insert_many(&collection, records).await
    }

    /// Sets every field of `fields` on all records matching `filter` and
    /// stamps the last-modified field with the server time.
    ///
    /// Returns the number of records the server actually changed.
    pub fn update_many<T: CollectionEntity>(
        &self,
        fields: &Document,
        filter: Document,
    ) -> MongoAccessResult<u64> {
        let collection = self.inner.resolve::<T>()?;
        let update = self.inner.update_document(fields);
        self.inner
            .runtime
            .block_on(update_many(&collection, filter, update))?
    }

    pub async fn update_many_async<T: CollectionEntity>(
        &self,
        fields: &Document,
        filter: Document,
    ) -> MongoAccessResult<u64> {
        let collection = self.resolve_async::<T>().await?;
        let update = self.inner.update_document(fields);
        update_many(&collection, filter, update).await
    }

    /// Best-effort [`MongoAccess::update_many`]: starts the update and
    /// returns immediately.
    ///
    /// Only mapping errors are reported. The outcome of the update itself,
    /// success or failure, is logged and otherwise lost.
    pub fn update_many_detached<T: CollectionEntity>(
        &self,
        fields: &Document,
        filter: Document,
    ) -> MongoAccessResult<()> {
        mapping_of::<T>()?;
        let access = self.clone();
        let fields = fields.clone();
        self.inner.runtime.spawn_detached(async move {
            match access.update_many_async::<T>(&fields, filter).await {
                Ok(modified) => log::debug!(
                    "Detached update modified {} records of {}",
                    modified,
                    type_name::<T>()
                ),
                Err(err) => log::error!(
                    "Detached update of {} failed: {}",
                    type_name::<T>(),
                    err
                ),
            }
        })
    }

    /// Deletes all records matching `filter` and returns how many were removed.
    pub fn delete_many<T: CollectionEntity>(&self, filter: Document) -> MongoAccessResult<u64> {
        let collection = self.inner.resolve::<T>()?;
        self.inner
            .runtime
            .block_on(delete_many(&collection, filter))?
    }

    pub async fn delete_many_async<T: CollectionEntity>(&self, filter: Document) -> MongoAccessResult<u64> {
        let collection = self.resolve_async::<T>().await?;
        delete_many(&collection, filter).await
    }

    /// Best-effort [`MongoAccess::delete_many`]. Same reporting rules as
    /// [`MongoAccess::update_many_detached`].
    pub fn delete_many_detached<T: CollectionEntity>(&self, filter: Document) -> MongoAccessResult<()> {
        mapping_of::<T>()?;
        let access = self.clone();
        self.inner.runtime.spawn_detached(async move {
            match access.delete_many_async::<T>(filter).await {
                Ok(deleted) => log::debug!(
                    "Detached delete removed {} records of {}",
                    deleted,
                    type_name::<T>()
                ),
                Err(err) => log::error!(
                    "Detached delete of {} failed: {}",
                    type_name::<T>(),
                    err
                ),
            }
        })
    }

    /// Runs `transform` against a blocking query view of `T`'s collection and
    /// returns its result.
    pub fn query<T, M, F>(&self, transform: F) -> MongoAccessResult<M>
    where
        T: CollectionEntity,
        F: FnOnce(CollectionProxy<'_, T>) -> M,
    {
        let collection = self.inner.resolve::<T>()?;
        Ok(transform(CollectionProxy::new(collection, &self.inner.runtime)))
    }

    /// Runs `transform` against the native driver handle of `T`.
    pub fn query_ext<T, M, F>(&self, transform: F) -> MongoAccessResult<M>
    where
        T: CollectionEntity,
        F: FnOnce(&Collection<T>) -> M,
    {
        let collection = self.inner.resolve::<T>()?;
        Ok(transform(&collection))
    }

    /// Async counterpart of [`MongoAccess::query_ext`]. The handle is passed
    /// by value so the returned future can own it.
    pub async fn query_ext_async<T, M, F, Fut>(&self, transform: F) -> MongoAccessResult<M>
    where
        T: CollectionEntity,
        F: FnOnce(Collection<T>) -> Fut,
        Fut: Future<Output = M>,
    {
        let collection = self.resolve_async::<T>().await?;
        Ok(transform(collection).await)
    }
}

struct MongoAccessInner {
    config: AccessConfig,
    registry: CollectionRegistry,
    runtime: BlockingRuntime,
}

impl MongoAccessInner {
    fn new(config: AccessConfig) -> Self {
        MongoAccessInner {
            registry: CollectionRegistry::new(config.connection_string()),
            runtime: BlockingRuntime::new(&config),
            config,
        }
    }

    fn resolve<T: CollectionEntity>(&self) -> MongoAccessResult<Collection<T>> {
        if let Some(collection) = self.registry.cached::<T>() {
            return Ok(collection);
        }
        // mapping errors must not depend on being called from a blocking context
        let mapping = mapping_of::<T>()?;
        self.runtime
            .block_on(self.registry.open::<T>(&mapping, &self.runtime))?
    }

    fn update_document(&self, fields: &Document) -> Document {
        UpdateBuilder::new(
            self.config.last_modified_field(),
            self.config.update_value_mode(),
        )
        .set_all(fields)
        .build()
    }
}

impl Drop for MongoAccessInner {
    fn drop(&mut self) {
        // the driver spawns session cleanup when its last client handle drops,
        // which needs a runtime context
        let _guard = match tokio::runtime::Handle::try_current() {
            Ok(_) => None,
            Err(_) => self.runtime.enter(),
        };
        self.registry.clear();
    }
}

async fn insert_one<T: CollectionEntity>(collection: &Collection<T>, record: &T) -> MongoAccessResult<()> {
    collection.insert_one(record).await?;
    Ok(())
}

async fn insert_many<T: CollectionEntity>(collection: &Collection<T>, records: &[T]) -> MongoAccessResult<()> {
    if records.is_empty() {
        log::debug!("Nothing to insert into {}", collection.name());
        return Ok(());
    }
    collection.insert_many(records).await?;
    Ok(())
}

async fn update_many<T: CollectionEntity>(
    collection: &Collection<T>,
    filter: Document,
    update: Document,
) -> MongoAccessResult<u64> {
    let result = collection.update_many(filter, update).await?;
    Ok(result.modified_count)
}

async fn delete_many<T: CollectionEntity>(collection: &Collection<T>, filter: Document) -> MongoAccessResult<u64> {
    let result = collection.delete_many(filter).await?;
    Ok(result.deleted_count)
}
