//! HTTP surface for the SIC vector store.
//!
//! Exposes `GET /status` and `POST /search-index` (also under
//! `/v1/sic-vector-store`) on top of the lifecycle coordinator from
//! `sic-vector-store`.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, AppState};
