//! HTTP interface for launching reanalyses

/// Shared secret and allow list authentication
pub mod auth;
/// Validate and deserialise request bodies
pub mod request;
/// Endpoints and error responses
pub mod routes;
/// Configuration and collaborators shared by all handlers
pub mod state;
