//! Delicious Storefront library.
//!
//! The HTTP server lives in `main.rs`; everything else is exposed here so the
//! CLI can reuse the services and the tests can reach the handlers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
