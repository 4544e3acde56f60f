//! Server configuration, HTTP authentication and runtime.
pub mod auth;
pub mod config;
pub mod runtime;
