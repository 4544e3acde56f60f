//! Example tools shipped with the template.

pub mod async_ops;
pub mod basic;
pub mod data;
pub mod health;
pub mod statistics;
