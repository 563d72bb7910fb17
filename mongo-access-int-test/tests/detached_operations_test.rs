use mongo_access::CollectionProxy;
use mongo_access_int_test::test_util::{cleanup, create_test_context, run_test, Order};
use mongodb::bson::doc;
use std::time::Duration;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_detached_update_eventually_applies() {
    run_test(
        create_test_context,
        |ctx| {
            let access = ctx.access();
            access.insert_many(&[
                ctx.order("ada", "open", 1),
                ctx.order("grace", "open", 2),
                ctx.order("edsger", "open", 3),
            ])?;

            access.update_many_detached::<Order>(
                &doc! { "status": "archived" },
                doc! { "batch": ctx.batch() },
            )?;

            awaitility::at_most(Duration::from_secs(10)).until(|| {
                access
                    .query(|proxy: CollectionProxy<Order>| {
                        proxy.count(doc! { "batch": ctx.batch(), "status": "archived" })
                    })
                    .and_then(|count| count)
                    .map(|count| count == 3)
                    .unwrap_or(false)
            });

            let archived = access.query(|proxy: CollectionProxy<Order>| {
                proxy.find(doc! { "batch": ctx.batch() })
            })??;
            assert!(archived.iter().all(|o| o.last_modified.is_some()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_detached_delete_eventually_applies() {
    run_test(
        create_test_context,
        |ctx| {
            let access = ctx.access();
            access.insert_many(&[ctx.order("ada", "done", 1), ctx.order("grace", "done", 2)])?;

            access.delete_many_detached::<Order>(doc! { "batch": ctx.batch() })?;

            awaitility::at_most(Duration::from_secs(10)).until(|| {
                access
                    .query(|proxy: CollectionProxy<Order>| proxy.count(doc! { "batch": ctx.batch() }))
                    .and_then(|count| count)
                    .map(|count| count == 0)
                    .unwrap_or(false)
            });
            Ok(())
        },
        cleanup,
    )
}
