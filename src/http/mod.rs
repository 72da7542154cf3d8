//! HTTP API for the marketplace call sites.

mod error;
mod routes;
mod server;

pub use error::ApiError;
pub use routes::{router, AppState, MAX_CHAT_MESSAGE_CHARS};
pub use server::HttpServer;
