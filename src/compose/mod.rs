//! Compose manifest input
//!
//! This module loads docker-compose style manifests into an ordered
//! [`Manifest`] of [`ServiceSpec`] entries.

pub mod config;
pub mod parser;

pub use config::{CommandConfig, EnvironmentConfig, Manifest, Scalar, ServiceSpec};
pub use parser::ManifestParser;
