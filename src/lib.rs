//! endpoint-mirror: mirrors the ready endpoints behind Kubernetes Services
//! into rows of a Postgres table, so allowlists, inventories, and discovery
//! glue can query endpoint state with plain SQL instead of the Kubernetes
//! API.

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod queue;

pub use crate::error::{Error, Result};
