//! HTTP API handlers for emport-svc
//!
//! Export, import start/status/cancel, and health.

pub mod emport;
pub mod health;
pub mod owner;

pub use emport::emport_routes;
pub use health::health_routes;
pub use owner::{Owner, OWNER_HEADER};
