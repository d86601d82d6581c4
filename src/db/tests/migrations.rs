use crate::db::*;
use tempfile::{NamedTempFile, tempdir};

#[tokio::test]
async fn test_new_database_is_fully_migrated() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    assert_eq!(db.schema_version().await.unwrap(), 2);
    assert_eq!(db.count_documents().await.unwrap(), 0);
    assert!(db.last_sync().await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_reopen_does_not_reapply_migrations() {
    let temp_file = NamedTempFile::new().unwrap();

    let db = Database::new(temp_file.path()).await.unwrap();
    db.close().await;

    // Opening again must not try to recreate existing tables
    let db = Database::new(temp_file.path()).await.unwrap();
    assert_eq!(db.schema_version().await.unwrap(), 2);

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(applied, 2);

    db.close().await;
}

#[tokio::test]
async fn test_missing_parent_directory_is_created() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join(".xkcd").join("index.db");

    let db = Database::new(&path).await.unwrap();
    assert!(path.exists());

    db.close().await;
}
