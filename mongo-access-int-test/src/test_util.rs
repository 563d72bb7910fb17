use mongo_access::{MongoAccess, MongoAccessResult, UpdateValueMode};
use mongo_access_derive::CollectionEntity;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime};
use serde::{Deserialize, Serialize};
use std::env;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Environment variable holding the URI of the server live tests run against.
pub const TEST_URI_VAR: &str = "MONGO_ACCESS_TEST_URI";

pub const TEST_DATABASE: &str = "mongo_access_test";

/// Record type shared by the live tests. Every record carries the batch tag
/// of the test that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CollectionEntity)]
#[mapping(database = "mongo_access_test", collection = "orders")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub batch: String,
    pub customer: String,
    pub status: String,
    pub quantity: i32,
    #[serde(rename = "lastModified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime>,
}

impl Order {
    pub fn new(batch: &str, customer: &str, status: &str, quantity: i32) -> Self {
        Order {
            id: ObjectId::new(),
            batch: batch.to_string(),
            customer: customer.to_string(),
            status: status.to_string(),
            quantity,
            last_modified: None,
        }
    }
}

/// Runs a live test between `before` and `after`.
///
/// Skipped when no test server is configured. `after` runs even when the
/// test fails or panics, so tagged records do not pile up.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: FnOnce(TestContext) -> MongoAccessResult<()>,
    B: FnOnce() -> MongoAccessResult<TestContext>,
    A: FnOnce(TestContext) -> MongoAccessResult<()>,
{
    if test_uri().is_none() {
        eprintln!("Skipping live test: {} is not set", TEST_URI_VAR);
        return;
    }

    let start_time = Instant::now();
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed (took {:?}): {:?}", elapsed, e),
        Err(payload) => {
            eprintln!("\n========== Test Panicked (took {:?}) ==========", elapsed);
            panic::resume_unwind(payload);
        }
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    access: MongoAccess,
    batch: String,
}

impl TestContext {
    pub fn new(access: MongoAccess) -> Self {
        Self {
            access,
            batch: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn access(&self) -> MongoAccess {
        self.access.clone()
    }

    /// Tag of the records written by this test.
    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn order(&self, customer: &str, status: &str, quantity: i32) -> Order {
        Order::new(&self.batch, customer, status, quantity)
    }
}

pub fn test_uri() -> Option<String> {
    env::var(TEST_URI_VAR).ok().filter(|uri| !uri.trim().is_empty())
}

/// For tests that cannot go through [`run_test`]. Returns `true`, after
/// printing why, when the test should return early.
pub fn skip_without_server(test_name: &str) -> bool {
    if test_uri().is_none() {
        eprintln!("Skipping {}: {} is not set", test_name, TEST_URI_VAR);
        return true;
    }
    false
}

pub fn create_test_context() -> MongoAccessResult<TestContext> {
    let access = MongoAccess::builder()
        .connection_string(&test_uri().unwrap_or_default())
        .worker_threads(2)
        .build()?;
    Ok(TestContext::new(access))
}

pub fn create_stringify_test_context() -> MongoAccessResult<TestContext> {
    let access = MongoAccess::builder()
        .connection_string(&test_uri().unwrap_or_default())
        .worker_threads(2)
        .update_value_mode(UpdateValueMode::Stringify)
        .build()?;
    Ok(TestContext::new(access))
}

pub fn cleanup(ctx: TestContext) -> MongoAccessResult<()> {
    ctx.access()
        .delete_many::<Order>(doc! { "batch": ctx.batch() })?;
    Ok(())
}

pub async fn cleanup_async(ctx: TestContext) -> MongoAccessResult<()> {
    ctx.access()
        .delete_many_async::<Order>(doc! { "batch": ctx.batch() })
        .await?;
    Ok(())
}
