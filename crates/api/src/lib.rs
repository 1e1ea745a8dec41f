//! Ferry API
//!
//! Administrative HTTP surface of a running agent, built on Axum.
//!
//! # Usage
//!
//! ```ignore
//! use ferry_api::{AppState, ApiServer};
//!
//! let state = AppState::new(Arc::clone(&agent));
//! let server = ApiServer::bind(&config.api_server, state, cancel.clone()).await?;
//! // ... agent runs ...
//! cancel.cancel();
//! server.join().await;
//! ```
//!
//! # Endpoints
//!
//! - `GET /version` - Build information in the JSON envelope
//! - `GET /ping` - Liveness, replies `OK`
//! - `GET /debug` - Plain-text diagnostic dump
//! - `GET /empty` - Drain both queues, replies with the removed counts
//!
//! Every other path answers 404 with the envelope and `NOT_FOUND`.
//!
//! # Envelope
//!
//! ```json
//! { "Code": 200, "Success": true, "Message": "", "Object": { ... } }
//! ```
//!
//! The HTTP status always equals `Code`.

pub mod error;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Result};
pub use response::ApiResponse;
pub use routes::build_router;
pub use server::ApiServer;
pub use state::{AppState, VersionInfo};
