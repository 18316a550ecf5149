//! Terminal client for an aggregated news API.
//!
//! Pages are loaded cache-first through [`news::FetchCoordinator`], kept in a
//! TTL cache ([`cache`]) and turned into date-grouped feeds by
//! [`view_model`]. The terminal UI lives in the binary.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod news;
pub mod query;
pub mod session;
pub mod view_model;
