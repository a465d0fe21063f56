use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Checkout events
    SaleCompleted {
        sale_id: Uuid,
        total: Decimal,
        line_count: usize,
    },
    LowStock {
        material_id: Uuid,
        name: String,
        remaining: i32,
        reorder_point: i32,
    },

    // Catalog events
    MaterialCreated(Uuid),
    MaterialUpdated(Uuid),
    MaterialDeleted(Uuid),
    SupplierCreated(Uuid),
    SupplierDeleted(Uuid),

    // Reorder events
    ReorderRequested {
        reorder_id: Uuid,
        material_id: Uuid,
        requested_qty: i32,
    },
    ReorderStatusChanged {
        reorder_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ReorderReceived {
        reorder_id: Uuid,
        material_id: Uuid,
        requested_qty: i32,
    },

    // Admin events
    SalesCleared,
    DataReset,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Used after a transaction commits, where the state change must not be
    /// reported as an error just because nobody is listening.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Consumes events off the channel and logs them. Runs for the lifetime of
/// the process; exits when all senders are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::SaleCompleted {
                sale_id,
                total,
                line_count,
            } => {
                info!(sale_id = %sale_id, total = %total, line_count, "Sale completed");
            }
            Event::LowStock {
                material_id,
                name,
                remaining,
                reorder_point,
            } => {
                warn!(
                    material_id = %material_id,
                    name = %name,
                    remaining,
                    reorder_point,
                    "Material at or below reorder point"
                );
            }
            Event::ReorderReceived {
                reorder_id,
                material_id,
                requested_qty,
            } => {
                info!(
                    reorder_id = %reorder_id,
                    material_id = %material_id,
                    requested_qty,
                    "Reorder received, stock incremented"
                );
            }
            other => {
                info!(event = ?other, "Event processed");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}
