pub mod auth;
pub mod cases;
pub mod query;
pub mod sync;
