use crate::{
    entities::{material, reorder_request, sale, sale_item, supplier, usage_log_entry},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use sea_orm::TransactionTrait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// A sale line joined with its material's display name
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleItemDetail {
    #[serde(flatten)]
    pub item: sale_item::Model,
    pub material_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<SaleItemDetail>,
}

/// One row of the sales CSV export
#[derive(Debug, Serialize)]
struct SaleExportRow {
    sale_id: Uuid,
    sale_date: String,
    total: String,
    items: String,
}

/// Sales history: listing, detail, CSV export, and the destructive admin
/// operations.
#[derive(Clone)]
pub struct SalesService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SalesService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Pages through sales, newest first.
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sale::Model>, u64), ServiceError> {
        let paginator = sale::Entity::find()
            .order_by_desc(sale::Column::SaleDate)
            .paginate(&*self.db, per_page.clamp(1, 200));

        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((sales, total))
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<SaleDetail, ServiceError> {
        let sale = sale::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(id))
            .find_also_related(material::Entity)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|(item, material)| SaleItemDetail {
                item,
                material_name: material.map(|m| m.name),
            })
            .collect();

        Ok(SaleDetail { sale, items })
    }

    /// Renders the full sales history as CSV, newest sale first. Line items
    /// collapse into a single `items` column like "Cement x 3; Sand x 2".
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<String, ServiceError> {
        let sales = sale::Entity::find()
            .order_by_desc(sale::Column::SaleDate)
            .all(&*self.db)
            .await?;

        let lines = sale_item::Entity::find()
            .find_also_related(material::Entity)
            .all(&*self.db)
            .await?;

        let mut items_by_sale: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (item, material) in lines {
            let name = material
                .map(|m| m.name)
                .unwrap_or_else(|| item.material_id.to_string());
            items_by_sale
                .entry(item.sale_id)
                .or_default()
                .push(format!("{} x {}", name, item.quantity));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for sale in sales {
            writer
                .serialize(SaleExportRow {
                    sale_id: sale.id,
                    sale_date: sale.sale_date.to_rfc3339(),
                    total: sale.total.to_string(),
                    items: items_by_sale
                        .remove(&sale.id)
                        .map(|parts| parts.join("; "))
                        .unwrap_or_default(),
                })
                .map_err(|e| ServiceError::InternalError(format!("CSV write failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("CSV flush failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ServiceError::InternalError(format!("CSV was not UTF-8: {}", e)))
    }

    /// Deletes all sales and their line items. Stock levels and the usage
    /// ledger are untouched.
    #[instrument(skip(self))]
    pub async fn clear_sales(&self) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;

        sale_item::Entity::delete_many().exec(&txn).await?;
        let deleted = sale::Entity::delete_many().exec(&txn).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::SalesCleared).await;

        Ok(deleted.rows_affected)
    }

    /// Wipes every table. Child tables go first so the operation also works
    /// against backends that enforce the foreign keys eagerly.
    #[instrument(skip(self))]
    pub async fn reset_all(&self) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        sale_item::Entity::delete_many().exec(&txn).await?;
        sale::Entity::delete_many().exec(&txn).await?;
        usage_log_entry::Entity::delete_many().exec(&txn).await?;
        reorder_request::Entity::delete_many().exec(&txn).await?;
        material::Entity::delete_many().exec(&txn).await?;
        supplier::Entity::delete_many().exec(&txn).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::DataReset).await;

        Ok(())
    }
}
