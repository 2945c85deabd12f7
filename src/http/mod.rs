//! HTTP routing layer

pub mod rooms;
pub mod routes;

pub use routes::build_router;
