use crate::{
    entities::{material, reorder_request, supplier},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
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
pub struct CreateSupplier {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub contact: Option<String>,
    #[validate(length(max = 512))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplier {
    #[validate(length(min = 1, max = 255, message = "name cannot be empty"))]
    pub name: Option<String>,
    pub contact: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            contact: Set(input.contact),
            address: Set(input.address),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::SupplierCreated(model.id))
            .await;

        Ok(model)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let paginator = supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .paginate(&*self.db, per_page.clamp(1, 200));

        let total = paginator.num_items().await?;
        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((suppliers, total))
    }

    /// Materials supplied by one supplier, ordered by name.
    pub async fn supplier_materials(
        &self,
        id: Uuid,
    ) -> Result<Vec<material::Model>, ServiceError> {
        self.get_supplier(id).await?;

        Ok(material::Entity::find()
            .filter(material::Column::SupplierId.eq(id))
            .order_by_asc(material::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        input: UpdateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_supplier(id).await?;

        let mut active: supplier::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(contact) = input.contact {
            active.contact = Set(contact);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a supplier unless materials or reorder requests still point
    /// at it.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let supplier = supplier::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))?;

        let material_refs = material::Entity::find()
            .filter(material::Column::SupplierId.eq(id))
            .count(&txn)
            .await?;
        let reorder_refs = reorder_request::Entity::find()
            .filter(reorder_request::Column::SupplierId.eq(id))
            .count(&txn)
            .await?;

        if material_refs + reorder_refs > 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Supplier '{}' is referenced by {} materials and {} reorders and cannot be deleted",
                supplier.name, material_refs, reorder_refs
            )));
        }

        supplier.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SupplierDeleted(id))
            .await;

        Ok(())
    }
}
