use std::io::Write as _;

use catalog_server::import::{FeedImporter, ImportConfig, ImportError};
use catalog_server::test_support::{TestDatabase, TestDatabaseError, TestFixtures};
use tempfile::NamedTempFile;

const FEED_HEADER: &str =
    "feed_product_id;sku;name;qty;status;visibility;price;type_id;description;image;tags";

fn write_feed(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp feed");
    writeln!(file, "{FEED_HEADER}").expect("write feed header");
    for row in rows {
        writeln!(file, "{row}").expect("write feed row");
    }
    file.flush().expect("flush feed");
    file
}

async fn provision() -> Option<TestDatabase> {
    match TestDatabase::new().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping import pipeline test: container runtime unavailable: {err}");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

#[tokio::test]
async fn imports_new_rows_and_skips_existing_and_invalid() {
    let Some(test_db) = provision().await else {
        return;
    };
    let pool = test_db.pool_clone();

    TestFixtures::new(&pool)
        .insert_product("100", "Existing product", 1, true)
        .await
        .expect("failed to seed existing product");

    let feed = write_feed(&[
        "100;SKU-100;Existing product;4;1;1;5.00;simple;Old description;old.jpg;old",
        "101;SKU-101;Garden Widget;5;1;1;9.99;simple;A widget;widget.jpg;a, b ,c",
        ";SKU-102;No Feed Id;1;1;1;1.00;simple;;;",
        "103;SKU-103;;1;1;1;1.00;simple;;;",
    ]);

    let importer = FeedImporter::new(pool.clone(), ImportConfig::new(feed.path()))
        .expect("valid import config");
    let stats = importer.run().await.expect("import should succeed");

    assert_eq!(stats.rows_read, 4);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.skipped_existing, 1);
    assert_eq!(stats.skipped_invalid, 2);
    assert_eq!(stats.batches_flushed, 1);

    let (name, qty, status, visibility, tags): (String, i32, i32, bool, serde_json::Value) =
        sqlx::query_as(
            "SELECT name, qty, status, visibility, tags FROM products WHERE feed_product_id = '101'",
        )
        .fetch_one(&pool)
        .await
        .expect("imported product should exist");

    assert_eq!(name, "Garden Widget");
    assert_eq!(qty, 5);
    assert_eq!(status, 1);
    assert!(visibility);
    assert_eq!(tags, serde_json::json!(["a", "b", "c"]));

    // The pre-existing row was not touched.
    let existing_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE feed_product_id = '100'")
            .fetch_one(&pool)
            .await
            .expect("count query");
    assert_eq!(existing_count, 1);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn five_rows_with_batch_size_two_flush_three_batches() {
    let Some(test_db) = provision().await else {
        return;
    };
    let pool = test_db.pool_clone();

    let feed = write_feed(&[
        "201;SKU-201;Product One;1;1;1;1.00;simple;;;",
        "202;SKU-202;Product Two;1;1;1;2.00;simple;;;",
        "203;SKU-203;Product Three;1;1;1;3.00;simple;;;",
        "204;SKU-204;Product Four;1;1;1;4.00;simple;;;",
        "205;SKU-205;Product Five;1;1;1;5.00;simple;;;",
    ]);

    let config = ImportConfig::new(feed.path()).with_batch_size(2);
    let importer = FeedImporter::new(pool.clone(), config).expect("valid import config");
    let stats = importer.run().await.expect("import should succeed");

    assert_eq!(stats.inserted, 5);
    assert_eq!(stats.batches_flushed, 3);

    // All rows of a run share one timestamp, with created_at == updated_at.
    let distinct_timestamps: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT created_at) FROM products")
            .fetch_one(&pool)
            .await
            .expect("count query");
    assert_eq!(distinct_timestamps, 1);

    let mismatched: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE created_at <> updated_at")
            .fetch_one(&pool)
            .await
            .expect("count query");
    assert_eq!(mismatched, 0);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn header_only_feed_inserts_nothing() {
    let Some(test_db) = provision().await else {
        return;
    };
    let pool = test_db.pool_clone();

    let feed = write_feed(&[]);

    let importer = FeedImporter::new(pool.clone(), ImportConfig::new(feed.path()))
        .expect("valid import config");
    let stats = importer.run().await.expect("import should succeed");

    assert_eq!(stats.rows_read, 0);
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.batches_flushed, 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .expect("count query");
    assert_eq!(count, 0);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn storage_failure_keeps_previously_committed_batches() {
    let Some(test_db) = provision().await else {
        return;
    };
    let pool = test_db.pool_clone();

    // Batch size 2: the first two rows commit, then the malformed qty in the
    // second batch makes its insert fail as a whole.
    let feed = write_feed(&[
        "301;SKU-301;Product One;1;1;1;1.00;simple;;;",
        "302;SKU-302;Product Two;1;1;1;2.00;simple;;;",
        "303;SKU-303;Product Three;not-a-number;1;1;3.00;simple;;;",
        "304;SKU-304;Product Four;1;1;1;4.00;simple;;;",
    ]);

    let config = ImportConfig::new(feed.path()).with_batch_size(2);
    let importer = FeedImporter::new(pool.clone(), config).expect("valid import config");
    let result = importer.run().await;

    assert!(matches!(result, Err(ImportError::Database(_))));

    let ids: Vec<String> =
        sqlx::query_scalar("SELECT feed_product_id FROM products ORDER BY feed_product_id")
            .fetch_all(&pool)
            .await
            .expect("id query");
    assert_eq!(ids, vec!["301", "302"]);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn reimport_of_the_same_feed_is_idempotent() {
    let Some(test_db) = provision().await else {
        return;
    };
    let pool = test_db.pool_clone();

    let feed = write_feed(&[
        "401;SKU-401;Product One;1;1;1;1.00;simple;;;",
        "402;SKU-402;Product Two;1;1;1;2.00;simple;;;",
    ]);

    let first = FeedImporter::new(pool.clone(), ImportConfig::new(feed.path()))
        .expect("valid import config")
        .run()
        .await
        .expect("first import should succeed");
    assert_eq!(first.inserted, 2);

    let second = FeedImporter::new(pool.clone(), ImportConfig::new(feed.path()))
        .expect("valid import config")
        .run()
        .await
        .expect("second import should succeed");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(second.batches_flushed, 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .expect("count query");
    assert_eq!(count, 2);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn duplicate_ids_within_one_feed_are_both_inserted() {
    let Some(test_db) = provision().await else {
        return;
    };
    let pool = test_db.pool_clone();

    // The dedup snapshot is captured before the run and never refreshed, so
    // a repeated id inside one file is queued twice.
    let feed = write_feed(&[
        "500;SKU-500;First occurrence;1;1;1;1.00;simple;;;",
        "500;SKU-500;Second occurrence;1;1;1;1.00;simple;;;",
    ]);

    let stats = FeedImporter::new(pool.clone(), ImportConfig::new(feed.path()))
        .expect("valid import config")
        .run()
        .await
        .expect("import should succeed");
    assert_eq!(stats.inserted, 2);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE feed_product_id = '500'")
            .fetch_one(&pool)
            .await
            .expect("count query");
    assert_eq!(count, 2);

    test_db.close().await.expect("failed to drop test database");
}
