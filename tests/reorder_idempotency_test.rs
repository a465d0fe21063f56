use buildstock_api::entities::reorder_request::ReorderStatus;
use buildstock_api::errors::ServiceError;
use buildstock_api::events::{process_events, EventSender};
use buildstock_api::migrator::Migrator;
use buildstock_api::services::materials::{CreateMaterial, MaterialService};
use buildstock_api::services::reorders::{CreateReorder, ReorderService};
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

async fn setup() -> (Arc<DatabaseConnection>, MaterialService, ReorderService) {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1);
    let db = Database::connect(opts).await.expect("db connect");
    Migrator::up(&db, None).await.expect("migrations");
    let db = Arc::new(db);

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    let sender = EventSender::new(tx);

    let materials = MaterialService::new(db.clone(), sender.clone());
    let reorders = ReorderService::new(db.clone(), sender);
    (db, materials, reorders)
}

#[tokio::test]
async fn received_transition_increments_stock_exactly_once() {
    let (_db, materials, reorders) = setup().await;

    let cement = materials
        .create_material(CreateMaterial {
            name: "Cement".into(),
            unit: "bag".into(),
            quantity: 10,
            reorder_point: 25,
            price_per_unit: dec!(12.50),
            supplier_id: None,
        })
        .await
        .unwrap();

    let reorder = reorders
        .create_reorder(CreateReorder {
            material_id: cement.id,
            supplier_id: None,
            requested_qty: 50,
        })
        .await
        .unwrap();
    assert_eq!(reorder.status, ReorderStatus::Pending);

    let ordered = reorders
        .update_status(reorder.id, ReorderStatus::Ordered)
        .await
        .unwrap();
    assert_eq!(ordered.status, ReorderStatus::Ordered);
    // Ordered must not touch stock
    assert_eq!(materials.get_material(cement.id).await.unwrap().quantity, 10);

    let received = reorders
        .update_status(reorder.id, ReorderStatus::Received)
        .await
        .unwrap();
    assert_eq!(received.status, ReorderStatus::Received);
    assert_eq!(materials.get_material(cement.id).await.unwrap().quantity, 60);

    // Replaying the transition must be rejected and must not restock again
    let err = reorders
        .update_status(reorder.id, ReorderStatus::Received)
        .await
        .expect_err("replay must fail");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(materials.get_material(cement.id).await.unwrap().quantity, 60);
}

#[tokio::test]
async fn received_is_terminal() {
    let (_db, materials, reorders) = setup().await;

    let sand = materials
        .create_material(CreateMaterial {
            name: "Sand".into(),
            unit: "ton".into(),
            quantity: 5,
            reorder_point: 10,
            price_per_unit: dec!(38.00),
            supplier_id: None,
        })
        .await
        .unwrap();

    let reorder = reorders
        .create_reorder(CreateReorder {
            material_id: sand.id,
            supplier_id: None,
            requested_qty: 20,
        })
        .await
        .unwrap();

    reorders
        .update_status(reorder.id, ReorderStatus::Received)
        .await
        .unwrap();

    // No moving back to an earlier state once the stock increment landed
    let err = reorders
        .update_status(reorder.id, ReorderStatus::Pending)
        .await
        .expect_err("regression must fail");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(materials.get_material(sand.id).await.unwrap().quantity, 25);
}

#[tokio::test]
async fn reorder_for_unknown_material_is_rejected() {
    let (_db, _materials, reorders) = setup().await;

    let err = reorders
        .create_reorder(CreateReorder {
            material_id: Uuid::new_v4(),
            supplier_id: None,
            requested_qty: 10,
        })
        .await
        .expect_err("unknown material");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn nonpositive_quantity_is_rejected() {
    let (_db, materials, reorders) = setup().await;

    let cement = materials
        .create_material(CreateMaterial {
            name: "Cement".into(),
            unit: "bag".into(),
            quantity: 10,
            reorder_point: 5,
            price_per_unit: dec!(12.50),
            supplier_id: None,
        })
        .await
        .unwrap();

    let err = reorders
        .create_reorder(CreateReorder {
            material_id: cement.id,
            supplier_id: None,
            requested_qty: 0,
        })
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
