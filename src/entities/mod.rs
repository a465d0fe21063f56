pub mod material;
pub mod reorder_request;
pub mod sale;
pub mod sale_item;
pub mod supplier;
pub mod usage_log_entry;
