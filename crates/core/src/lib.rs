//! Printshop Core - Shared types library.
//!
//! This crate provides the types shared by every Printshop client component:
//! - `client` - Session store, route guards, error interceptor, API client
//! - `cli` - Command-line front-end over the client library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. Everything here is plain data that serializes to the
//! backend's JSON wire format.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, users and roles, auth DTOs, Stripe payment types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
