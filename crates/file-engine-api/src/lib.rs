//! File Engine API Library
//!
//! HTTP surface of the file engine: handlers, error rendering, and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod constants;
pub mod error;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
