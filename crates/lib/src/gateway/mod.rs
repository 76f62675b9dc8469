//! Gateway: HTTP endpoint layer.
//!
//! One port serves the platform webhook (`POST /api/messages`) plus health and info endpoints.
//! Services are built once at startup and shared immutably across requests.

mod server;

pub use server::{build_router, run_gateway, GatewayState};
