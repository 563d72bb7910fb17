use crate::entity::CollectionEntity;
use crate::errors::MongoAccessResult;
use crate::runtime::BlockingRuntime;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Collection, Cursor, Namespace};
use std::future::IntoFuture;

/// Blocking, query-only view of an entity's collection.
///
/// Handed out by [`MongoAccess::query`](crate::MongoAccess::query); every
/// call runs to completion before returning. Filters are plain MongoDB query
/// documents and are passed to the driver untouched.
pub struct CollectionProxy<'a, T: CollectionEntity> {
    collection: Collection<T>,
    runtime: &'a BlockingRuntime,
}

impl<'a, T: CollectionEntity> CollectionProxy<'a, T> {
    pub(crate) fn new(collection: Collection<T>, runtime: &'a BlockingRuntime) -> Self {
        CollectionProxy { collection, runtime }
    }

    /// Returns every record matching `filter`.
    pub fn find(&self, filter: Document) -> MongoAccessResult<Vec<T>> {
        self.runtime.block_on(find_all(&self.collection, filter, None))?
    }

    /// Returns the records matching `filter`, with sorting, paging and
    /// projection taken from `options`.
    pub fn find_with_options(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> MongoAccessResult<Vec<T>> {
        self.runtime
            .block_on(find_all(&self.collection, filter, Some(options)))?
    }

    pub fn find_one(&self, filter: Document) -> MongoAccessResult<Option<T>> {
        let result = self.runtime.block_on(self.collection.find_one(filter).into_future())?;
        Ok(result?)
    }

    /// Looks a record up by its `_id`.
    pub fn find_by_id(&self, id: impl Into<Bson>) -> MongoAccessResult<Option<T>> {
        self.find_one(doc! { "_id": id.into() })
    }

    pub fn count(&self, filter: Document) -> MongoAccessResult<u64> {
        let result = self
            .runtime
            .block_on(self.collection.count_documents(filter).into_future())?;
        Ok(result?)
    }

    /// Distinct values of `field` among the records matching `filter`.
    pub fn distinct(&self, field: &str, filter: Document) -> MongoAccessResult<Vec<Bson>> {
        let result = self
            .runtime
            .block_on(self.collection.distinct(field, filter).into_future())?;
        Ok(result?)
    }

    pub fn namespace(&self) -> Namespace {
        self.collection.namespace()
    }

    /// The underlying driver handle, for anything the proxy does not cover.
    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }
}

pub(crate) async fn find_all<T: CollectionEntity>(
    collection: &Collection<T>,
    filter: Document,
    options: Option<FindOptions>,
) -> MongoAccessResult<Vec<T>> {
    let mut cursor: Cursor<T> = collection.find(filter).with_options(options).await?;
    let mut records = Vec::new();
    while cursor.advance().await? {
        records.push(cursor.deserialize_current()?);
    }
    Ok(records)
}
