//! Shared library modules providing error types, loaders, host sampling and telemetry initialization.

pub mod errors;
pub mod loader;
pub mod system;
pub mod telemetry;
