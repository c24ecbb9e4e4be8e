//! Task definition registration and service rollout
//!
//! The translator never talks to the control plane. This module takes the
//! serialized document it produces and submits it through a
//! [`TaskDefinitionRegistry`], by default the `aws` command line client.

pub mod aws;
pub mod deployer;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use aws::AwsCliRegistry;
pub use deployer::{DeployOptions, Deployer};

/// A registered task definition revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Full ARN of the revision
    pub arn: String,
    /// Task definition family
    pub family: String,
    /// Revision number within the family
    pub revision: u32,
}

impl Revision {
    /// `family:revision`, as accepted by `--task-definition`
    pub fn task_definition(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}

/// Remote endpoint that stores task definitions and runs services
#[async_trait]
pub trait TaskDefinitionRegistry: Send + Sync {
    /// Register a serialized task definition, returning the new revision
    async fn register(&self, document: &str) -> Result<Revision>;

    /// Point `service` at `revision` and start a rollout
    async fn update_service(
        &self,
        cluster: Option<&str>,
        service: &str,
        revision: &Revision,
    ) -> Result<()>;
}
