pub mod api;
pub mod identity;
pub mod types;
