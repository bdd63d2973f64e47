//! Snapvault API crate - axum HTTP server, ingest and gallery handlers.
//!
//! Accepts capture submissions, serves the stored records as JSON and as an
//! HTML gallery, and streams new-capture notifications over SSE.

pub mod error;
pub mod gallery;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
