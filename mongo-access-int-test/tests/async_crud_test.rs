use mongo_access::{ErrorKind, MongoAccess};
use mongo_access_int_test::test_util::{
    cleanup_async, create_test_context, skip_without_server, Order,
};
use mongodb::bson::doc;
use mongodb::Collection;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_insert_and_find() {
    if skip_without_server("test_async_insert_and_find") {
        return;
    }
    let ctx = create_test_context().unwrap();
    let access = ctx.access();

    let order = ctx.order("ada", "open", 4);
    access.insert_one_async(&order).await.unwrap();

    let id = order.id;
    let found = access
        .query_ext_async(|orders: Collection<Order>| async move {
            orders.find_one(doc! { "_id": id }).await
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, Some(order));

    cleanup_async(ctx).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_update_and_delete_report_counts() {
    if skip_without_server("test_async_update_and_delete_report_counts") {
        return;
    }
    let ctx = create_test_context().unwrap();
    let access = ctx.access();

    access
        .insert_many_async(&[
            ctx.order("ada", "open", 1),
            ctx.order("grace", "open", 2),
            ctx.order("edsger", "closed", 3),
        ])
        .await
        .unwrap();

    let modified = access
        .update_many_async::<Order>(
            &doc! { "status": "done" },
            doc! { "batch": ctx.batch(), "status": "open" },
        )
        .await
        .unwrap();
    assert_eq!(modified, 2);

    let filter = doc! { "batch": ctx.batch(), "status": "done" };
    let deleted = access.delete_many_async::<Order>(filter.clone()).await.unwrap();
    assert_eq!(deleted, 2);
    let deleted = access.delete_many_async::<Order>(filter).await.unwrap();
    assert_eq!(deleted, 0);

    cleanup_async(ctx).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_insert_many_empty_is_noop() {
    if skip_without_server("test_async_insert_many_empty_is_noop") {
        return;
    }
    let ctx = create_test_context().unwrap();
    let access = ctx.access();

    access.insert_many_async::<Order>(&[]).await.unwrap();
    let count = access
        .query_ext_async(|orders: Collection<Order>| {
            let batch = ctx.batch().to_string();
            async move { orders.count_documents(doc! { "batch": batch }).await }
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 0);

    cleanup_async(ctx).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_call_from_async_code_is_rejected() {
    let access = MongoAccess::new("mongodb://localhost/test").unwrap();

    let err = access.delete_many::<Order>(doc! {}).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::RuntimeError);

    // a cached handle is served, but the driver call itself still cannot block
    access.resolve_async::<Order>().await.unwrap();
    assert!(access.resolve::<Order>().is_ok());
    let err = access
        .update_many::<Order>(&doc! { "status": "done" }, doc! {})
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::RuntimeError);
}
