//! Pause Dej' HTTP API.
//!
//! Library half of the `pausedej-api` binary: everything except process
//! startup lives here so integration tests can build the same router.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
