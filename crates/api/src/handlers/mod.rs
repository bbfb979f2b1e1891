//! Request handlers, one module per resource.
//!
//! Handlers validate input, call the repositories in `pausedej_db`, publish
//! a [`StoreEvent`](pausedej_events::StoreEvent) for every write and map
//! errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod dishes;
pub mod favorites;
pub mod newsletter;
pub mod orders;
pub mod payments;
pub mod profile;
pub mod promo;
pub mod push;
pub mod recommendations;
