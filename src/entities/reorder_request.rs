use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Request to restock a material, optionally directed at a supplier
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reorder_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub material_id: Uuid,
    #[sea_orm(nullable)]
    pub supplier_id: Option<Uuid>,
    pub requested_qty: i32,
    pub status: ReorderStatus,
    pub requested_at: DateTime<Utc>,
}

/// Reorder lifecycle. Received is terminal: it carries the one-shot stock
/// increment, so a request never moves away from it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Display, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReorderStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "Pending")]
    #[strum(serialize = "Pending")]
    Pending,
    #[sea_orm(string_value = "ordered")]
    #[serde(rename = "Ordered")]
    #[strum(serialize = "Ordered")]
    Ordered,
    #[sea_orm(string_value = "received")]
    #[serde(rename = "Received")]
    #[strum(serialize = "Received")]
    Received,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::material::Entity",
        from = "Column::MaterialId",
        to = "super::material::Column::Id"
    )]
    Material,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
