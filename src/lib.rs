//! ecs-compose - docker-compose manifests to ECS task definitions
//!
//! ecs-compose reads a compose-style manifest and produces the JSON task
//! definition that Amazon ECS expects:
//!
//! - Manifest loading (YAML or JSON, v1 or `services:` layout)
//! - Pure translation into an ordered task definition document
//! - Compact serialization under the control plane's size limit
//! - Registration and service rollout through the `aws` CLI

pub mod compose;
pub mod deploy;
pub mod ecs;
pub mod error;

pub use error::{EcsComposeError, Result};
