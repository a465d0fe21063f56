pub mod checkout;
pub mod common;
pub mod materials;
pub mod notifications;
pub mod reorders;
pub mod sales;
pub mod suppliers;

use crate::{
    events::EventSender,
    services::{
        checkout::CheckoutService, forecasting::ForecastingService,
        materials::MaterialService, reorders::ReorderService, sales::SalesService,
        suppliers::SupplierService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// All domain services, constructed once and shared through the app state.
#[derive(Clone)]
pub struct AppServices {
    pub materials: MaterialService,
    pub suppliers: SupplierService,
    pub checkout: CheckoutService,
    pub sales: SalesService,
    pub reorders: ReorderService,
    pub forecasting: ForecastingService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            materials: MaterialService::new(db.clone(), event_sender.clone()),
            suppliers: SupplierService::new(db.clone(), event_sender.clone()),
            checkout: CheckoutService::new(db.clone(), event_sender.clone()),
            sales: SalesService::new(db.clone(), event_sender.clone()),
            reorders: ReorderService::new(db.clone(), event_sender),
            forecasting: ForecastingService::new(db),
        }
    }
}
