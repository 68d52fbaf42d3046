pub mod api;
pub mod lifecycle;
pub mod models;
