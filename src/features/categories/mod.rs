pub mod dtos;
pub mod handlers;
pub mod hierarchy;
pub mod models;
pub mod routes;
pub mod services;

pub use services::CategoryService;
