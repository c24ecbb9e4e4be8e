//! `aws ecs` command line registry

use super::{Revision, TaskDefinitionRegistry};
use crate::error::{EcsComposeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

/// Default AWS CLI executable
pub const DEFAULT_AWS_PROGRAM: &str = "aws";

/// Registry backed by the `aws` CLI
#[derive(Debug, Clone)]
pub struct AwsCliRegistry {
    /// Executable to run
    program: String,
    /// `--region`
    region: Option<String>,
    /// `--profile`
    profile: Option<String>,
}

impl Default for AwsCliRegistry {
    fn default() -> Self {
        Self {
            program: DEFAULT_AWS_PROGRAM.to_string(),
            region: None,
            profile: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterOutput {
    task_definition: RegisteredTaskDefinition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredTaskDefinition {
    task_definition_arn: String,
    family: String,
    revision: u32,
}

impl AwsCliRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable
    pub fn program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Set the AWS region
    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set the named AWS profile
    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    fn ecs_args(&self, subcommand: &str) -> Vec<String> {
        let mut args = vec!["ecs".to_string(), subcommand.to_string()];
        if let Some(region) = &self.region {
            args.extend(["--region".to_string(), region.clone()]);
        }
        if let Some(profile) = &self.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }
        args.extend(["--output".to_string(), "json".to_string()]);
        args
    }

    async fn run(&self, args: &[String]) -> Result<Vec<u8>> {
        tracing::debug!("Running {} {}", self.program, args[..2].join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EcsComposeError::Deploy(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EcsComposeError::Deploy(format!(
                "{} {} failed: {}",
                self.program,
                args[..2].join(" "),
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Read the revision out of `register-task-definition` output
pub fn parse_register_output(stdout: &[u8]) -> Result<Revision> {
    let output: RegisterOutput = serde_json::from_slice(stdout).map_err(|e| {
        EcsComposeError::UnexpectedOutput(format!("register-task-definition: {}", e))
    })?;

    Ok(Revision {
        arn: output.task_definition.task_definition_arn,
        family: output.task_definition.family,
        revision: output.task_definition.revision,
    })
}

#[async_trait]
impl TaskDefinitionRegistry for AwsCliRegistry {
    async fn register(&self, document: &str) -> Result<Revision> {
        let mut args = self.ecs_args("register-task-definition");
        args.extend(["--cli-input-json".to_string(), document.to_string()]);

        let stdout = self.run(&args).await?;
        parse_register_output(&stdout)
    }

    async fn update_service(
        &self,
        cluster: Option<&str>,
        service: &str,
        revision: &Revision,
    ) -> Result<()> {
        let mut args = self.ecs_args("update-service");
        if let Some(cluster) = cluster {
            args.extend(["--cluster".to_string(), cluster.to_string()]);
        }
        args.extend([
            "--service".to_string(),
            service.to_string(),
            "--task-definition".to_string(),
            revision.task_definition(),
        ]);

        self.run(&args).await?;
        Ok(())
    }
}
