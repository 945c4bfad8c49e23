//! Core types and trait definitions for the Roster NGO CRM client.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. The
//! gateway traits in [`gateway`] are implemented by `roster-baas`; the stores
//! in `roster-store` and the terminal front-end in `roster-cli` depend only on
//! the abstractions defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod completeness;
pub mod contract;
pub mod document;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod person;
pub mod query;
pub mod route;
pub mod template;
pub mod theme;
pub mod user;
pub mod validate;
pub mod wire;
pub mod wizard;

pub use error::{Error, Result};
