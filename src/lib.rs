//! Sugarcane harvest loss ledger.
//!
//! Harvests are registered into an in-memory [`ledger::Ledger`] with their
//! loss figures computed once by [`calc`], and synchronized on request with a
//! JSON document ([`store::JsonFileStore`]) or a relational table
//! ([`store::RelationalStore`]). A [`session::Session`] ties the three together.

pub mod calc;
pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod models;
pub mod render;
pub mod session;
pub mod shell;
pub mod store;

pub use error::{Error, Result};
