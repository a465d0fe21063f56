use crate::{
    entities::{material, reorder_request, sale_item, supplier, usage_log_entry},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMaterial {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "unit is required"))]
    pub unit: String,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "reorder point cannot be negative"))]
    pub reorder_point: i32,
    pub price_per_unit: Decimal,
    pub supplier_id: Option<Uuid>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterial {
    #[validate(length(min = 1, max = 255, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 32, message = "unit cannot be empty"))]
    pub unit: Option<String>,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "reorder point cannot be negative"))]
    pub reorder_point: Option<i32>,
    pub price_per_unit: Option<Decimal>,
    pub supplier_id: Option<Option<Uuid>>,
}

/// Catalog CRUD for materials
#[derive(Clone)]
pub struct MaterialService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl MaterialService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_material(
        &self,
        input: CreateMaterial,
    ) -> Result<material::Model, ServiceError> {
        input.validate()?;

        if input.price_per_unit < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price per unit cannot be negative".to_string(),
            ));
        }

        if let Some(supplier_id) = input.supplier_id {
            self.ensure_supplier_exists(supplier_id).await?;
        }

        let existing = material::Entity::find()
            .filter(material::Column::Name.eq(input.name.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Material '{}' already exists",
                input.name
            )));
        }

        let model = material::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            unit: Set(input.unit),
            quantity: Set(input.quantity),
            reorder_point: Set(input.reorder_point),
            price_per_unit: Set(input.price_per_unit),
            supplier_id: Set(input.supplier_id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::MaterialCreated(model.id))
            .await;

        Ok(model)
    }

    pub async fn get_material(&self, id: Uuid) -> Result<material::Model, ServiceError> {
        material::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))
    }

    pub async fn get_material_by_name(
        &self,
        name: &str,
    ) -> Result<material::Model, ServiceError> {
        material::Entity::find()
            .filter(material::Column::Name.eq(name))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Material '{}' not found", name)))
    }

    /// Pages through the catalog ordered by name.
    #[instrument(skip(self))]
    pub async fn list_materials(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<material::Model>, u64), ServiceError> {
        let paginator = material::Entity::find()
            .order_by_asc(material::Column::Name)
            .paginate(&*self.db, per_page.clamp(1, 200));

        let total = paginator.num_items().await?;
        let materials = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((materials, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_material(
        &self,
        id: Uuid,
        input: UpdateMaterial,
    ) -> Result<material::Model, ServiceError> {
        input.validate()?;

        if let Some(price) = input.price_per_unit {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price per unit cannot be negative".to_string(),
                ));
            }
        }

        let existing = self.get_material(id).await?;

        if let Some(name) = &input.name {
            if *name != existing.name {
                let clash = material::Entity::find()
                    .filter(material::Column::Name.eq(name.clone()))
                    .one(&*self.db)
                    .await?;
                if clash.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Material '{}' already exists",
                        name
                    )));
                }
            }
        }
        if let Some(Some(supplier_id)) = input.supplier_id {
            self.ensure_supplier_exists(supplier_id).await?;
        }

        let mut active: material::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(reorder_point) = input.reorder_point {
            active.reorder_point = Set(reorder_point);
        }
        if let Some(price) = input.price_per_unit {
            active.price_per_unit = Set(price);
        }
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        active.updated_at = Set(Some(chrono::Utc::now()));

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MaterialUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Deletes a material unless sales history, usage history, or reorder
    /// requests still reference it.
    #[instrument(skip(self))]
    pub async fn delete_material(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let material = material::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))?;

        let sale_refs = sale_item::Entity::find()
            .filter(sale_item::Column::MaterialId.eq(id))
            .count(&txn)
            .await?;
        let usage_refs = usage_log_entry::Entity::find()
            .filter(usage_log_entry::Column::MaterialId.eq(id))
            .count(&txn)
            .await?;
        let reorder_refs = reorder_request::Entity::find()
            .filter(reorder_request::Column::MaterialId.eq(id))
            .count(&txn)
            .await?;

        if sale_refs + usage_refs + reorder_refs > 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Material '{}' has history ({} sale lines, {} usage entries, {} reorders) and cannot be deleted",
                material.name, sale_refs, usage_refs, reorder_refs
            )));
        }

        material.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::MaterialDeleted(id))
            .await;

        Ok(())
    }

    /// Materials at or below their reorder point, ordered by name.
    pub async fn low_stock_materials(&self) -> Result<Vec<material::Model>, ServiceError> {
        use sea_orm::sea_query::Expr;

        Ok(material::Entity::find()
            .filter(
                Expr::col(material::Column::Quantity)
                    .lte(Expr::col(material::Column::ReorderPoint)),
            )
            .order_by_asc(material::Column::Name)
            .all(&*self.db)
            .await?)
    }

    async fn ensure_supplier_exists(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Supplier {} does not exist", supplier_id))
            })?;
        Ok(())
    }
}
