mod common;

use common::{exec, open, select_all, text};
use websql_middleware::prelude::*;
use websql_middleware::FIXED_COLLECTION;
use websql_middleware::statement::StatementKind;

#[tokio::test]
async fn insert_maps_columns_to_params_and_reports_key() {
    let (_memory, db) = open("insert", CollectionMode::PerStatement).await;

    let first = exec(
        &db,
        "INSERT INTO t (a, b) VALUES (?, ?)",
        vec![RowValues::Int(1), text("x")],
    )
    .await
    .unwrap();
    let second = exec(
        &db,
        "insert into t (a, b) values (?, ?)",
        vec![RowValues::Int(2), text("y")],
    )
    .await
    .unwrap();

    assert_eq!(first.insert_id, Some(1));
    assert_eq!(second.insert_id, Some(2));
    assert!(first.rows.is_empty());

    let rows = select_all(&db, "t").await;
    assert_eq!(rows.length(), 2);
    let row = rows.item(0).unwrap();
    assert_eq!(row.id(), first.insert_id);
    assert_eq!(row.get("a"), Some(&RowValues::Int(1)));
    assert_eq!(row.get("b"), Some(&text("x")));
}

#[tokio::test]
async fn select_lists_every_record_in_key_order() {
    let (_memory, db) = open("select", CollectionMode::PerStatement).await;
    for n in 0..5 {
        exec(&db, "INSERT INTO items (n) VALUES (?)", vec![RowValues::Int(n)])
            .await
            .unwrap();
    }

    // The WHERE clause is ignored; SELECT always scans the collection.
    let rows = exec(&db, "SELECT * FROM items WHERE n = 3", Vec::new())
        .await
        .unwrap()
        .rows;
    assert_eq!(rows.length(), 5);
    for i in 0..rows.length() {
        let n = i64::try_from(i).unwrap();
        assert_eq!(rows.item(i).unwrap().get("n"), Some(&RowValues::Int(n)));
    }
    assert!(rows.item(5).is_none());
}

#[tokio::test]
async fn update_with_null_id_errors_without_mutation() {
    let (_memory, db) = open("update_null", CollectionMode::PerStatement).await;
    exec(&db, "INSERT INTO t (a) VALUES (?)", vec![RowValues::Int(1)])
        .await
        .unwrap();

    for params in [
        vec![RowValues::Int(9), RowValues::Null],
        vec![RowValues::Int(9)],
        vec![RowValues::Int(9), RowValues::Int(1), RowValues::Null],
    ] {
        let err = exec(&db, "UPDATE t SET a=? WHERE id = ?", params)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WebSqlError::MissingId {
                kind: StatementKind::Update
            }
        ));
    }

    let rows = select_all(&db, "t").await;
    assert_eq!(rows.item(0).unwrap().get("a"), Some(&RowValues::Int(1)));
}

#[tokio::test]
async fn insert_with_missing_key_param_generates_the_key() {
    let (_memory, db) = open("insert_missing_key", CollectionMode::PerStatement).await;

    let inserted = exec(&db, "INSERT INTO t (a, id) VALUES (?, ?)", vec![RowValues::Int(1)])
        .await
        .unwrap();
    assert_eq!(inserted.insert_id, Some(1));

    let rows = select_all(&db, "t").await;
    assert_eq!(rows.item(0).unwrap().id(), Some(1));
    assert_eq!(rows.item(0).unwrap().get("a"), Some(&RowValues::Int(1)));
}

#[tokio::test]
async fn update_merges_into_existing_record() {
    let (_memory, db) = open("update_merge", CollectionMode::PerStatement).await;
    let id = exec(
        &db,
        "INSERT INTO t (a, b) VALUES (?, ?)",
        vec![RowValues::Int(1), text("x")],
    )
    .await
    .unwrap()
    .insert_id
    .unwrap();

    let result = exec(
        &db,
        "UPDATE t SET a=? WHERE id = ?",
        vec![RowValues::Int(9), RowValues::Int(id)],
    )
    .await
    .unwrap();
    assert_eq!(result.rows_affected, Some(1));

    let rows = select_all(&db, "t").await;
    assert_eq!(rows.length(), 1);
    let row = rows.item(0).unwrap();
    assert_eq!(row.id(), Some(id));
    assert_eq!(row.get("a"), Some(&RowValues::Int(9)));
    assert_eq!(row.get("b"), Some(&text("x")));
}

#[tokio::test]
async fn update_of_missing_id_writes_a_record() {
    let (_memory, db) = open("update_missing", CollectionMode::PerStatement).await;
    exec(&db, "INSERT INTO t (a) VALUES (?)", vec![RowValues::Int(1)])
        .await
        .unwrap();

    let result = exec(
        &db,
        "UPDATE t SET a = ?, b = ? WHERE id = ?",
        vec![RowValues::Int(5), text("new"), RowValues::Int(42)],
    )
    .await
    .unwrap();
    assert_eq!(result.rows_affected, Some(1));

    let rows = select_all(&db, "t").await;
    assert_eq!(rows.length(), 2);
    let row = rows.item(1).unwrap();
    assert_eq!(row.id(), Some(42));
    assert_eq!(row.get("b"), Some(&text("new")));
}

#[tokio::test]
async fn delete_removes_record_and_always_reports_one_row() {
    let (_memory, db) = open("delete", CollectionMode::PerStatement).await;
    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let result = exec(&db, "INSERT INTO t (name) VALUES (?)", vec![text(name)])
            .await
            .unwrap();
        ids.push(result.insert_id.unwrap());
    }

    let delete = "DELETE FROM t WHERE id = ?";
    let first = exec(&db, delete, vec![RowValues::Int(ids[1])]).await.unwrap();
    let rows = select_all(&db, "t").await;
    assert_eq!(rows.length(), 2);
    assert!(rows.iter().all(|row| row.id() != Some(ids[1])));

    let second = exec(&db, delete, vec![RowValues::Int(ids[1])]).await.unwrap();
    assert_eq!(first.rows_affected, Some(1));
    assert_eq!(second.rows_affected, Some(1));
    assert_eq!(select_all(&db, "t").await.length(), 2);
}

#[tokio::test]
async fn delete_without_key_is_missing_id() {
    let (_memory, db) = open("delete_null", CollectionMode::PerStatement).await;
    let err = exec(&db, "DELETE FROM t WHERE id = ?", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WebSqlError::MissingId {
            kind: StatementKind::Delete
        }
    ));
}

#[tokio::test]
async fn insert_update_delete_round() {
    let (_memory, db) = open("scenario", CollectionMode::PerStatement).await;

    let id = exec(
        &db,
        "INSERT INTO t (a,b) VALUES (?,?)",
        vec![RowValues::Int(1), text("x")],
    )
    .await
    .unwrap()
    .insert_id
    .unwrap();
    let rows = select_all(&db, "t").await;
    assert_eq!(rows.length(), 1);
    assert_eq!(
        rows.item(0).unwrap().to_json(),
        serde_json::json!({"id": id, "a": 1, "b": "x"})
    );

    exec(
        &db,
        "UPDATE t SET a=? WHERE id = ?",
        vec![RowValues::Int(9), RowValues::Int(id)],
    )
    .await
    .unwrap();
    assert_eq!(
        select_all(&db, "t").await.item(0).unwrap().to_json(),
        serde_json::json!({"id": id, "a": 9, "b": "x"})
    );

    exec(&db, "DELETE FROM t WHERE id = ?", vec![RowValues::Int(id)])
        .await
        .unwrap();
    assert_eq!(select_all(&db, "t").await.length(), 0);
}

#[tokio::test]
async fn unrecognized_statement_is_invalid_command() {
    for mode in [CollectionMode::PerStatement, CollectionMode::Fixed] {
        let (_memory, db) = open("unrecognized", mode).await;
        let err = exec(&db, "CREATE TABLE t (a)", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WebSqlError::InvalidCommand(_)), "{mode:?}");
    }
}

#[tokio::test]
async fn statement_without_table_is_missing_table() {
    let (_memory, db) = open("no_table", CollectionMode::PerStatement).await;
    let err = exec(&db, "SELECT 1", Vec::new()).await.unwrap_err();
    assert!(matches!(err, WebSqlError::MissingTable(_)));
}

#[tokio::test]
async fn fixed_mode_shares_one_collection() {
    let (memory, db) = open("fixed", CollectionMode::Fixed).await;
    exec(&db, "INSERT INTO users (name) VALUES (?)", vec![text("ann")])
        .await
        .unwrap();
    exec(&db, "INSERT INTO orders (total) VALUES (?)", vec![RowValues::Int(3)])
        .await
        .unwrap();

    assert_eq!(select_all(&db, "anything").await.length(), 2);

    let exported = memory.export_json("fixed").await.unwrap().unwrap();
    let collections = exported["collections"].as_object().unwrap();
    assert_eq!(collections.len(), 1);
    assert!(collections.contains_key(FIXED_COLLECTION));
}
