//! Core types for the Printshop client.
//!
//! This module provides type-safe wrappers for the domain concepts the
//! client exchanges with the backend.

pub mod auth;
pub mod email;
pub mod id;
pub mod payment;
pub mod user;

pub use auth::{ApiEnvelope, AuthData, AuthSession, LoginRequest, RegisterRequest};
pub use email::{Email, EmailError};
pub use id::*;
pub use payment::*;
pub use user::{User, UserRole};
