use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BuildStock API",
        version = "0.2.0",
        description = r#"
Inventory and point-of-sale backend for construction materials.

- **Materials**: stock catalog with reorder points and per-unit pricing
- **Suppliers**: sourcing directory linked to materials
- **Checkout**: atomic multi-line sales that decrement stock
- **Sales**: history, detail view, and CSV export
- **Reorders**: restock requests with a one-shot Received transition
- **Notifications**: low-stock report with depletion forecasts

Checkout is all-or-nothing: a single failing line rolls back the whole
batch and no stock moves.
        "#,
        license(name = "MIT")
    ),
    paths(
        crate::handlers::materials::create_material,
        crate::handlers::materials::list_materials,
        crate::handlers::materials::get_material,
        crate::handlers::materials::update_material,
        crate::handlers::materials::delete_material,
        crate::handlers::materials::low_stock_materials,
        crate::handlers::materials::forecast_material,
        crate::handlers::materials::material_reorders,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::supplier_materials,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
        crate::handlers::checkout::checkout,
        crate::handlers::sales::list_sales,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::export_sales,
        crate::handlers::sales::clear_sales,
        crate::handlers::sales::reset_all,
        crate::handlers::reorders::create_reorder,
        crate::handlers::reorders::list_reorders,
        crate::handlers::reorders::get_reorder,
        crate::handlers::reorders::update_reorder_status,
        crate::handlers::notifications::low_stock,
    ),
    components(schemas(
        crate::entities::material::Model,
        crate::entities::material::StockStatus,
        crate::entities::supplier::Model,
        crate::entities::sale::Model,
        crate::entities::sale_item::Model,
        crate::entities::usage_log_entry::Model,
        crate::entities::reorder_request::Model,
        crate::entities::reorder_request::ReorderStatus,
        crate::services::materials::CreateMaterial,
        crate::services::materials::UpdateMaterial,
        crate::services::suppliers::CreateSupplier,
        crate::services::suppliers::UpdateSupplier,
        crate::services::checkout::CheckoutLine,
        crate::services::checkout::CheckoutReceipt,
        crate::services::checkout::LowStockNotice,
        crate::services::reorders::CreateReorder,
        crate::services::forecasting::DepletionForecast,
        crate::services::forecasting::LowStockEntry,
        crate::handlers::checkout::CheckoutRequest,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::reorders::UpdateReorderStatusRequest,
    )),
    tags(
        (name = "materials", description = "Stock catalog"),
        (name = "suppliers", description = "Supplier directory"),
        (name = "checkout", description = "Point-of-sale checkout"),
        (name = "sales", description = "Sales history and export"),
        (name = "reorders", description = "Restock requests"),
        (name = "notifications", description = "Low-stock reporting"),
        (name = "admin", description = "Destructive maintenance"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document at
/// /api-docs/openapi.json.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
