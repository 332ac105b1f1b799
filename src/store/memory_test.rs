use super::*;
use crate::error::ErrorCode;
use crate::shape::{Geometry, Segment, Style};

fn board(name: &str) -> BoardId {
    BoardId::parse(name).unwrap()
}

fn line(n: f64) -> Shape {
    Shape::new(Geometry::Line(Segment { x1: 0.0, y1: 0.0, x2: n, y2: n }), &Style::default())
}

#[tokio::test]
async fn list_unknown_board_is_empty() {
    let store = MemoryShapeStore::new();
    assert!(store.list(&board("default")).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_appends_in_order_per_board() {
    let store = MemoryShapeStore::new();
    let a = board("a");
    let b = board("b");
    let first = line(1.0);
    let second = line(2.0);
    store.create(&a, &first).await.unwrap();
    store.create(&a, &second).await.unwrap();
    store.create(&b, &line(3.0)).await.unwrap();

    assert_eq!(store.list(&a).await.unwrap(), vec![first, second]);
    assert_eq!(store.list(&b).await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_with_existing_id_replaces_in_place() {
    let store = MemoryShapeStore::new();
    let a = board("a");
    let shape = line(1.0);
    store.create(&a, &shape).await.unwrap();
    let mut changed = shape.clone();
    changed.color = "red".into();
    store.create(&a, &changed).await.unwrap();

    assert_eq!(store.list(&a).await.unwrap(), vec![changed]);
}

#[tokio::test]
async fn delete_missing_shape_reports_not_found() {
    let store = MemoryShapeStore::new();
    let a = board("a");
    let err = store.delete(&a, &ShapeId::from("nope")).await.unwrap_err();
    assert_eq!(err, StoreError::NotFound(ShapeId::from("nope")));
    assert_eq!(err.error_code(), "E_NOT_FOUND");
}

#[tokio::test]
async fn delete_removes_only_that_shape() {
    let store = MemoryShapeStore::new();
    let a = board("a");
    let keep = line(1.0);
    let gone = line(2.0);
    store.seed(&a, vec![keep.clone(), gone.clone()]).await;

    store.delete(&a, &gone.id).await.unwrap();
    assert_eq!(store.list(&a).await.unwrap(), vec![keep]);
}

#[tokio::test]
async fn delete_all_is_idempotent() {
    let store = MemoryShapeStore::new();
    let a = board("a");
    store.seed(&a, vec![line(1.0)]).await;
    store.delete_all(&a).await.unwrap();
    store.delete_all(&a).await.unwrap();
    assert!(store.list(&a).await.unwrap().is_empty());
}

#[tokio::test]
async fn offline_store_fails_every_call() {
    let store = MemoryShapeStore::new();
    let a = board("a");
    store.seed(&a, vec![line(1.0)]).await;
    store.set_offline(true);

    let err = store.list(&a).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(err.retryable());
    assert!(store.create(&a, &line(2.0)).await.is_err());
    assert!(store.delete_all(&a).await.is_err());
    assert_eq!(store.snapshot(&a).await.len(), 1);

    store.set_offline(false);
    assert_eq!(store.list(&a).await.unwrap().len(), 1);
}
