use crate::{
    entities::{material, sale, sale_item, usage_log_entry},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One line of a checkout batch
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutLine {
    pub material_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// A material left at or below its reorder point by this checkout
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LowStockNotice {
    pub material_id: Uuid,
    pub name: String,
    pub remaining: i32,
    pub reorder_point: i32,
}

/// Result of a committed checkout
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutReceipt {
    pub sale_id: Uuid,
    pub total: Decimal,
    pub line_count: usize,
    pub low_stock: Vec<LowStockNotice>,
}

/// Point-of-sale checkout. The whole batch commits or none of it does.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Processes a multi-line sale atomically.
    ///
    /// Each line decrements stock with a conditional update, so two
    /// concurrent checkouts can never drive a quantity negative. Any
    /// failing line rolls back the entire batch, including lines that
    /// already succeeded.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn checkout(
        &self,
        lines: &[CheckoutLine],
    ) -> Result<CheckoutReceipt, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Checkout requires at least one line".to_string(),
            ));
        }
        for line in lines {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid quantity {} for material {}",
                    line.quantity, line.material_id
                )));
            }
        }

        let txn = self.db.begin().await?;
        let receipt = match self.checkout_in_txn(&txn, lines).await {
            Ok(receipt) => {
                txn.commit().await?;
                receipt
            }
            Err(err) => {
                txn.rollback().await?;
                return Err(err);
            }
        };

        // Events only after the commit; the sale exists no matter what the
        // consumer does with them.
        self.event_sender
            .send_or_log(Event::SaleCompleted {
                sale_id: receipt.sale_id,
                total: receipt.total,
                line_count: receipt.line_count,
            })
            .await;
        for notice in &receipt.low_stock {
            self.event_sender
                .send_or_log(Event::LowStock {
                    material_id: notice.material_id,
                    name: notice.name.clone(),
                    remaining: notice.remaining,
                    reorder_point: notice.reorder_point,
                })
                .await;
        }

        Ok(receipt)
    }

    async fn checkout_in_txn(
        &self,
        txn: &DatabaseTransaction,
        lines: &[CheckoutLine],
    ) -> Result<CheckoutReceipt, ServiceError> {
        let now = Utc::now();
        let sale_id = Uuid::new_v4();

        // Sale row first so line items can reference it; total is finalized
        // below once every line has priced.
        sale::ActiveModel {
            id: Set(sale_id),
            sale_date: Set(now),
            total: Set(Decimal::ZERO),
        }
        .insert(txn)
        .await?;

        let mut total = Decimal::ZERO;
        let mut low_stock: Vec<LowStockNotice> = Vec::new();

        for line in lines {
            // Decrement succeeds only if enough stock remains. Duplicate
            // lines for one material each re-check against the already
            // decremented quantity.
            let result = material::Entity::update_many()
                .col_expr(
                    material::Column::Quantity,
                    Expr::col(material::Column::Quantity).sub(line.quantity),
                )
                .filter(material::Column::Id.eq(line.material_id))
                .filter(material::Column::Quantity.gte(line.quantity))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(
                    match material::Entity::find_by_id(line.material_id).one(txn).await? {
                        None => ServiceError::NotFound(format!(
                            "Material {} not found",
                            line.material_id
                        )),
                        Some(m) => ServiceError::InsufficientStock(format!(
                            "Not enough {}: requested {}, available {}",
                            m.name, line.quantity, m.quantity
                        )),
                    },
                );
            }

            let material = material::Entity::find_by_id(line.material_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Material {} missing after decrement",
                        line.material_id
                    ))
                })?;

            total += material.price_per_unit * Decimal::from(line.quantity);

            sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                material_id: Set(material.id),
                quantity: Set(line.quantity),
                unit_price: Set(material.price_per_unit),
            }
            .insert(txn)
            .await?;

            // Usage ledger entry records the post-decrement level; the
            // forecaster regresses on this column.
            usage_log_entry::ActiveModel {
                id: Set(Uuid::new_v4()),
                material_id: Set(material.id),
                quantity_used: Set(line.quantity),
                remaining_quantity: Set(material.quantity),
                recorded_at: Set(now),
            }
            .insert(txn)
            .await?;

            if material.quantity <= material.reorder_point {
                // Keep one notice per material, reflecting the final level
                low_stock.retain(|n| n.material_id != material.id);
                low_stock.push(LowStockNotice {
                    material_id: material.id,
                    name: material.name.clone(),
                    remaining: material.quantity,
                    reorder_point: material.reorder_point,
                });
            }
        }

        sale::ActiveModel {
            id: Set(sale_id),
            total: Set(total),
            ..Default::default()
        }
        .update(txn)
        .await?;

        Ok(CheckoutReceipt {
            sale_id,
            total,
            line_count: lines.len(),
            low_stock,
        })
    }
}
