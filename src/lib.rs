//! CRUD service for product recommendations: associations between a source
//! catalog item and a target item, with a type, status, weight and likes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
