use buildstock_api::entities::{material, supplier};
use buildstock_api::errors::ServiceError;
use buildstock_api::events::{process_events, EventSender};
use buildstock_api::migrator::Migrator;
use buildstock_api::services::checkout::{CheckoutLine, CheckoutService};
use buildstock_api::services::materials::{CreateMaterial, MaterialService};
use buildstock_api::services::sales::SalesService;
use buildstock_api::services::suppliers::{CreateSupplier, SupplierService};
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::sync::mpsc;

struct Harness {
    db: Arc<DatabaseConnection>,
    materials: MaterialService,
    suppliers: SupplierService,
    checkout: CheckoutService,
    sales: SalesService,
}

async fn setup() -> Harness {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1);
    let db = Database::connect(opts).await.expect("db connect");
    Migrator::up(&db, None).await.expect("migrations");
    let db = Arc::new(db);

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    let sender = EventSender::new(tx);

    Harness {
        materials: MaterialService::new(db.clone(), sender.clone()),
        suppliers: SupplierService::new(db.clone(), sender.clone()),
        checkout: CheckoutService::new(db.clone(), sender.clone()),
        sales: SalesService::new(db.clone(), sender),
        db,
    }
}

async fn seed_and_sell(h: &Harness) -> material::Model {
    let cement = h
        .materials
        .create_material(CreateMaterial {
            name: "Cement".into(),
            unit: "bag".into(),
            quantity: 100,
            reorder_point: 10,
            price_per_unit: dec!(12.50),
            supplier_id: None,
        })
        .await
        .unwrap();

    h.checkout
        .checkout(&[CheckoutLine {
            material_id: cement.id,
            quantity: 3,
        }])
        .await
        .unwrap();

    cement
}

#[tokio::test]
async fn sale_detail_includes_material_names() {
    let h = setup().await;
    seed_and_sell(&h).await;

    let (sales, total) = h.sales.list_sales(1, 20).await.unwrap();
    assert_eq!(total, 1);

    let detail = h.sales.get_sale(sales[0].id).await.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].material_name.as_deref(), Some("Cement"));
    assert_eq!(detail.items[0].item.quantity, 3);
    assert_eq!(detail.sale.total, dec!(37.50));
}

#[tokio::test]
async fn csv_export_collapses_line_items() {
    let h = setup().await;
    seed_and_sell(&h).await;

    let csv = h.sales.export_csv().await.unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("sale_id,sale_date,total,items"),
        "header row"
    );
    let row = lines.next().expect("one data row");
    assert!(row.contains("Cement x 3"), "items column: {}", row);
    assert!(row.contains("37.50") || row.contains("37.5"), "total: {}", row);
}

#[tokio::test]
async fn clear_sales_preserves_stock_and_ledger() {
    let h = setup().await;
    let cement = seed_and_sell(&h).await;

    let deleted = h.sales.clear_sales().await.unwrap();
    assert_eq!(deleted, 1);

    let (_, total) = h.sales.list_sales(1, 20).await.unwrap();
    assert_eq!(total, 0);

    // Stock and the usage ledger are untouched
    let after = h.materials.get_material(cement.id).await.unwrap();
    assert_eq!(after.quantity, 97);
    use buildstock_api::entities::usage_log_entry;
    assert_eq!(
        usage_log_entry::Entity::find().count(&*h.db).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn reset_wipes_everything() {
    let h = setup().await;
    seed_and_sell(&h).await;

    h.sales.reset_all().await.unwrap();

    assert_eq!(material::Entity::find().count(&*h.db).await.unwrap(), 0);
    assert_eq!(supplier::Entity::find().count(&*h.db).await.unwrap(), 0);
    let (_, total) = h.sales.list_sales(1, 20).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn material_with_history_cannot_be_deleted() {
    let h = setup().await;
    let cement = seed_and_sell(&h).await;

    let err = h
        .materials
        .delete_material(cement.id)
        .await
        .expect_err("history blocks delete");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn referenced_supplier_cannot_be_deleted() {
    let h = setup().await;

    let supplier = h
        .suppliers
        .create_supplier(CreateSupplier {
            name: "Granite State Aggregates".into(),
            contact: None,
            address: None,
        })
        .await
        .unwrap();

    h.materials
        .create_material(CreateMaterial {
            name: "Sand".into(),
            unit: "ton".into(),
            quantity: 10,
            reorder_point: 2,
            price_per_unit: dec!(38.00),
            supplier_id: Some(supplier.id),
        })
        .await
        .unwrap();

    let err = h
        .suppliers
        .delete_supplier(supplier.id)
        .await
        .expect_err("referenced supplier");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // An unreferenced supplier deletes cleanly
    let orphan = h
        .suppliers
        .create_supplier(CreateSupplier {
            name: "Lakeside Timber Co".into(),
            contact: None,
            address: None,
        })
        .await
        .unwrap();
    h.suppliers.delete_supplier(orphan.id).await.unwrap();
}

#[tokio::test]
async fn duplicate_material_name_is_conflict() {
    let h = setup().await;
    seed_and_sell(&h).await;

    let err = h
        .materials
        .create_material(CreateMaterial {
            name: "Cement".into(),
            unit: "bag".into(),
            quantity: 5,
            reorder_point: 1,
            price_per_unit: dec!(11.00),
            supplier_id: None,
        })
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, ServiceError::Conflict(_)));
}
