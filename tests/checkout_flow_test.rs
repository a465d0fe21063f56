use buildstock_api::entities::{material, sale, sale_item, usage_log_entry};
use buildstock_api::errors::ServiceError;
use buildstock_api::events::{process_events, EventSender};
use buildstock_api::migrator::Migrator;
use buildstock_api::services::checkout::{CheckoutLine, CheckoutService};
use buildstock_api::services::forecasting::{DepletionForecast, ForecastingService};
use buildstock_api::services::materials::{CreateMaterial, MaterialService};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

// In-memory SQLite must stay on a single connection or every connection
// gets its own empty database.
async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1);
    let db = Database::connect(opts).await.expect("db connect");
    Migrator::up(&db, None).await.expect("migrations");
    Arc::new(db)
}

fn event_sender() -> EventSender {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    EventSender::new(tx)
}

async fn seed_material(
    materials: &MaterialService,
    name: &str,
    quantity: i32,
    reorder_point: i32,
    price: rust_decimal::Decimal,
) -> material::Model {
    materials
        .create_material(CreateMaterial {
            name: name.to_string(),
            unit: "bag".to_string(),
            quantity,
            reorder_point,
            price_per_unit: price,
            supplier_id: None,
        })
        .await
        .expect("create material")
}

#[tokio::test]
async fn checkout_decrements_stock_and_records_ledger() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender.clone());
    let checkout = CheckoutService::new(db.clone(), sender);

    let cement = seed_material(&materials, "Cement", 100, 20, dec!(12.50)).await;
    let sand = seed_material(&materials, "Sand", 50, 10, dec!(38.00)).await;

    let receipt = checkout
        .checkout(&[
            CheckoutLine {
                material_id: cement.id,
                quantity: 4,
            },
            CheckoutLine {
                material_id: sand.id,
                quantity: 2,
            },
        ])
        .await
        .expect("checkout");

    // 4 * 12.50 + 2 * 38.00
    assert_eq!(receipt.total, dec!(126.00));
    assert_eq!(receipt.line_count, 2);
    assert!(receipt.low_stock.is_empty());

    let cement_after = materials.get_material(cement.id).await.unwrap();
    let sand_after = materials.get_material(sand.id).await.unwrap();
    assert_eq!(cement_after.quantity, 96);
    assert_eq!(sand_after.quantity, 48);

    let stored_sale = sale::Entity::find_by_id(receipt.sale_id)
        .one(&*db)
        .await
        .unwrap()
        .expect("sale persisted");
    assert_eq!(stored_sale.total, dec!(126.00));

    let items = sale_item::Entity::find()
        .filter(sale_item::Column::SaleId.eq(receipt.sale_id))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let ledger = usage_log_entry::Entity::find()
        .filter(usage_log_entry::Column::MaterialId.eq(cement.id))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].quantity_used, 4);
    assert_eq!(ledger[0].remaining_quantity, 96);
}

#[tokio::test]
async fn failing_line_rolls_back_entire_batch() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender.clone());
    let checkout = CheckoutService::new(db.clone(), sender);

    let cement = seed_material(&materials, "Cement", 100, 20, dec!(12.50)).await;
    let sand = seed_material(&materials, "Sand", 5, 2, dec!(38.00)).await;

    let err = checkout
        .checkout(&[
            CheckoutLine {
                material_id: cement.id,
                quantity: 10,
            },
            CheckoutLine {
                material_id: sand.id,
                quantity: 8, // only 5 available
            },
        ])
        .await
        .expect_err("second line must fail");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // First line's decrement must have been rolled back too
    let cement_after = materials.get_material(cement.id).await.unwrap();
    assert_eq!(cement_after.quantity, 100);

    assert_eq!(sale::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(sale_item::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(usage_log_entry::Entity::find().count(&*db).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_material_aborts_batch() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender.clone());
    let checkout = CheckoutService::new(db.clone(), sender);

    let cement = seed_material(&materials, "Cement", 100, 20, dec!(12.50)).await;

    let err = checkout
        .checkout(&[
            CheckoutLine {
                material_id: cement.id,
                quantity: 1,
            },
            CheckoutLine {
                material_id: Uuid::new_v4(),
                quantity: 1,
            },
        ])
        .await
        .expect_err("unknown material must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let cement_after = materials.get_material(cement.id).await.unwrap();
    assert_eq!(cement_after.quantity, 100);
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let db = setup_db().await;
    let sender = event_sender();
    let checkout = CheckoutService::new(db, sender);

    let err = checkout.checkout(&[]).await.expect_err("empty batch");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn sale_landing_on_reorder_point_flags_low_stock() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender.clone());
    let checkout = CheckoutService::new(db.clone(), sender);

    let cement = seed_material(&materials, "Cement", 120, 25, dec!(12.50)).await;

    // 120 - 95 = 25, exactly the reorder point: LOW
    let receipt = checkout
        .checkout(&[CheckoutLine {
            material_id: cement.id,
            quantity: 95,
        }])
        .await
        .expect("checkout");

    assert_eq!(receipt.low_stock.len(), 1);
    assert_eq!(receipt.low_stock[0].remaining, 25);
    assert_eq!(receipt.low_stock[0].name, "Cement");

    let after = materials.get_material(cement.id).await.unwrap();
    assert_eq!(after.status(), material::StockStatus::Low);

    // A further 30 exceeds the remaining 25 and must fail outright
    let err = checkout
        .checkout(&[CheckoutLine {
            material_id: cement.id,
            quantity: 30,
        }])
        .await
        .expect_err("overdraw");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    assert_eq!(materials.get_material(cement.id).await.unwrap().quantity, 25);
}

#[tokio::test]
async fn duplicate_lines_check_against_decremented_stock() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender.clone());
    let checkout = CheckoutService::new(db.clone(), sender);

    let cement = seed_material(&materials, "Cement", 10, 2, dec!(10.00)).await;

    // 7 + 7 = 14 > 10: the second line must see only 3 remaining and fail
    let err = checkout
        .checkout(&[
            CheckoutLine {
                material_id: cement.id,
                quantity: 7,
            },
            CheckoutLine {
                material_id: cement.id,
                quantity: 7,
            },
        ])
        .await
        .expect_err("combined quantity exceeds stock");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    assert_eq!(materials.get_material(cement.id).await.unwrap().quantity, 10);

    // 7 + 3 = 10 exactly drains the stock and succeeds
    let receipt = checkout
        .checkout(&[
            CheckoutLine {
                material_id: cement.id,
                quantity: 7,
            },
            CheckoutLine {
                material_id: cement.id,
                quantity: 3,
            },
        ])
        .await
        .expect("exact drain");
    assert_eq!(receipt.total, dec!(100.00));
    assert_eq!(materials.get_material(cement.id).await.unwrap().quantity, 0);
}

#[tokio::test]
async fn forecast_from_seeded_ledger() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender);
    let forecasting = ForecastingService::new(db.clone());

    let cement = seed_material(&materials, "Cement", 40, 10, dec!(12.50)).await;

    // Remaining 100/80/60/40 at days 0/5/10/15: slope -4/day, zero at day
    // 25, so 10.0 days remain after the last entry.
    let start = Utc::now() - Duration::days(15);
    for (offset, remaining) in [(0, 100), (5, 80), (10, 60), (15, 40)] {
        usage_log_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            material_id: Set(cement.id),
            quantity_used: Set(20),
            remaining_quantity: Set(remaining),
            recorded_at: Set(start + Duration::days(offset)),
        }
        .insert(&*db)
        .await
        .expect("insert ledger entry");
    }

    let forecast = forecasting.forecast_depletion(cement.id).await.unwrap();
    assert_eq!(forecast, DepletionForecast::Depletes { days: 10.0 });
}

#[tokio::test]
async fn forecast_with_sparse_ledger_is_insufficient() {
    let db = setup_db().await;
    let sender = event_sender();
    let materials = MaterialService::new(db.clone(), sender.clone());
    let checkout = CheckoutService::new(db.clone(), sender);
    let forecasting = ForecastingService::new(db.clone());

    let cement = seed_material(&materials, "Cement", 100, 20, dec!(12.50)).await;
    checkout
        .checkout(&[CheckoutLine {
            material_id: cement.id,
            quantity: 5,
        }])
        .await
        .unwrap();

    let forecast = forecasting.forecast_depletion(cement.id).await.unwrap();
    assert_eq!(forecast, DepletionForecast::InsufficientData);
}
