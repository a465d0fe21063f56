use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A stocked material with quantity, reorder threshold, and unit price
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub reorder_point: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price_per_unit: Decimal,
    #[sea_orm(nullable)]
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// LOW when quantity has fallen to or below the reorder point.
    pub fn status(&self) -> StockStatus {
        if self.quantity <= self.reorder_point {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.status() == StockStatus::Low
    }
}

/// Derived stock status, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockStatus {
    Low,
    Ok,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::usage_log_entry::Entity")]
    UsageLogEntries,
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
    #[sea_orm(has_many = "super::reorder_request::Entity")]
    ReorderRequests,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::usage_log_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageLogEntries.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

impl Related<super::reorder_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReorderRequests.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }

        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
