//! # BookSwap server
//! This crate hosts the HTTP server for the BookSwap marketplace. It is responsible for:
//! * Authenticating requests with the bearer tokens handed out by the identity provider.
//! * Translating requests into calls on the `bookswap_engine` APIs, and their results and errors into JSON responses.
//! * Wiring up the order event hooks, so that every order transition lands in the other party's notification inbox.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! `/health` is open. Everything else lives under `/api` and needs a bearer token. See [routes](routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
