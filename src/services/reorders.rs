use crate::{
    entities::{
        material,
        reorder_request::{self, ReorderStatus},
        supplier,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReorder {
    pub material_id: Uuid,
    pub supplier_id: Option<Uuid>,
    #[validate(range(min = 1, message = "requested quantity must be at least 1"))]
    pub requested_qty: i32,
}

/// Reorder workflow. The Received transition increments stock exactly once;
/// replays and regressions from Received are rejected.
#[derive(Clone)]
pub struct ReorderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ReorderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(material_id = %input.material_id))]
    pub async fn create_reorder(
        &self,
        input: CreateReorder,
    ) -> Result<reorder_request::Model, ServiceError> {
        input.validate()?;

        material::Entity::find_by_id(input.material_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Material {} not found", input.material_id))
            })?;

        if let Some(supplier_id) = input.supplier_id {
            supplier::Entity::find_by_id(supplier_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Supplier {} does not exist",
                        supplier_id
                    ))
                })?;
        }

        let model = reorder_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            material_id: Set(input.material_id),
            supplier_id: Set(input.supplier_id),
            requested_qty: Set(input.requested_qty),
            status: Set(ReorderStatus::Pending),
            requested_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ReorderRequested {
                reorder_id: model.id,
                material_id: model.material_id,
                requested_qty: model.requested_qty,
            })
            .await;

        Ok(model)
    }

    pub async fn get_reorder(&self, id: Uuid) -> Result<reorder_request::Model, ServiceError> {
        reorder_request::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reorder request {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_reorders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<ReorderStatus>,
    ) -> Result<(Vec<reorder_request::Model>, u64), ServiceError> {
        let mut query = reorder_request::Entity::find()
            .order_by_desc(reorder_request::Column::RequestedAt);
        if let Some(status) = status {
            query = query.filter(reorder_request::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, per_page.clamp(1, 200));
        let total = paginator.num_items().await?;
        let reorders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((reorders, total))
    }

    pub async fn reorders_for_material(
        &self,
        material_id: Uuid,
    ) -> Result<Vec<reorder_request::Model>, ServiceError> {
        Ok(reorder_request::Entity::find()
            .filter(reorder_request::Column::MaterialId.eq(material_id))
            .order_by_desc(reorder_request::Column::RequestedAt)
            .all(&*self.db)
            .await?)
    }

    /// Moves a reorder to a new status. Entering Received also adds the
    /// requested quantity to the material's stock; both happen in one
    /// transaction, and a conditional status update guarantees the
    /// increment cannot be applied twice.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: ReorderStatus,
    ) -> Result<reorder_request::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let reorder = reorder_request::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reorder request {} not found", id)))?;

        let old_status = reorder.status;
        if old_status == ReorderStatus::Received {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Reorder request {} was already received",
                id
            )));
        }

        if new_status == ReorderStatus::Received {
            // Guard against a concurrent transition winning between our
            // read above and this write.
            let updated = reorder_request::Entity::update_many()
                .col_expr(
                    reorder_request::Column::Status,
                    Expr::value(ReorderStatus::Received),
                )
                .filter(reorder_request::Column::Id.eq(id))
                .filter(reorder_request::Column::Status.ne(ReorderStatus::Received))
                .exec(&txn)
                .await?;
            if updated.rows_affected == 0 {
                txn.rollback().await?;
                return Err(ServiceError::Conflict(format!(
                    "Reorder request {} was already received",
                    id
                )));
            }

            let incremented = material::Entity::update_many()
                .col_expr(
                    material::Column::Quantity,
                    Expr::col(material::Column::Quantity).add(reorder.requested_qty),
                )
                .filter(material::Column::Id.eq(reorder.material_id))
                .exec(&txn)
                .await?;
            if incremented.rows_affected == 0 {
                txn.rollback().await?;
                return Err(ServiceError::NotFound(format!(
                    "Material {} not found",
                    reorder.material_id
                )));
            }
        } else {
            let mut active: reorder_request::ActiveModel = reorder.clone().into();
            active.status = Set(new_status);
            active.update(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ReorderStatusChanged {
                reorder_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;
        if new_status == ReorderStatus::Received {
            self.event_sender
                .send_or_log(Event::ReorderReceived {
                    reorder_id: id,
                    material_id: reorder.material_id,
                    requested_qty: reorder.requested_qty,
                })
                .await;
        }

        self.get_reorder(id).await
    }
}
