//! HTTP boundary
//!
//! The upload boundary (multipart) and retrieval boundary (inline view vs
//! attachment download), plus search, update, delete, audit-trail and
//! stats routes over the document store.

pub mod config;
pub mod document_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use document_routes::AppState;
pub use server::HttpServer;
