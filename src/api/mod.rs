//! HTTP trigger surface.
//!
//! Exposes the recall scan and QOF calculator as JSON endpoints under
//! `/api/`. `api_router()` returns a `Router` that can be mounted on any
//! axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{serve_until_ctrl_c, start_api_server, ApiServer};
pub use types::ApiContext;
