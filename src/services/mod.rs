pub mod checkout;
pub mod forecasting;
pub mod materials;
pub mod reorders;
pub mod sales;
pub mod suppliers;
