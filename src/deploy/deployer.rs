//! Registration and rollout with timeouts and retries

use super::{Revision, TaskDefinitionRegistry};
use crate::ecs::{TaskDefinition, MAX_TASK_DEFINITION_BYTES};
use crate::error::{EcsComposeError, Result};
use std::future::Future;
use std::time::Duration;

/// Deployment tuning
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Limit for a single registry call
    pub timeout: Duration,
    /// Extra attempts after a failed call
    pub retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 2,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Submits task definitions to a [`TaskDefinitionRegistry`]
pub struct Deployer<R> {
    registry: R,
    options: DeployOptions,
}

impl<R: TaskDefinitionRegistry> Deployer<R> {
    pub fn new(registry: R, options: DeployOptions) -> Self {
        Self { registry, options }
    }

    /// Register a serialized task definition
    pub async fn register(&self, document: &str) -> Result<Revision> {
        if document.len() > MAX_TASK_DEFINITION_BYTES {
            return Err(EcsComposeError::PayloadTooLarge {
                size: document.len(),
                limit: MAX_TASK_DEFINITION_BYTES,
            });
        }

        let revision = self
            .attempt("register-task-definition", || self.registry.register(document))
            .await?;
        tracing::info!("Registered task definition {}", revision);
        Ok(revision)
    }

    /// Roll each service onto `revision`, stopping at the first failure
    pub async fn update_services(
        &self,
        cluster: Option<&str>,
        services: &[String],
        revision: &Revision,
    ) -> Result<()> {
        for service in services {
            self.attempt("update-service", || {
                self.registry.update_service(cluster, service, revision)
            })
            .await?;
            tracing::info!("Updated service {} to {}", service, revision);
        }
        Ok(())
    }

    /// Serialize, register and roll out a task definition
    pub async fn deploy(
        &self,
        task: &TaskDefinition,
        cluster: Option<&str>,
        services: &[String],
    ) -> Result<Revision> {
        let document = task.to_compact_json()?;
        let revision = self.register(&document).await?;
        self.update_services(cluster, services, &revision).await?;
        Ok(revision)
    }

    async fn attempt<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.options.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(EcsComposeError::Timeout(format!(
                    "{} did not finish within {:?}",
                    operation, self.options.timeout
                ))),
            };

            match result {
                Err(e) if attempt < self.options.retries && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}",
                        operation,
                        attempt,
                        self.options.retries + 1,
                        e
                    );
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                other => return other,
            }
        }
    }
}

/// Failed spawns, non-zero exits and timeouts are retried. Unreadable output
/// is not: the call may already have taken effect.
fn is_retryable(err: &EcsComposeError) -> bool {
    matches!(err, EcsComposeError::Deploy(_) | EcsComposeError::Timeout(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{Manifest, ServiceSpec};
    use crate::deploy::aws::parse_register_output;
    use crate::ecs::ManifestTranslator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRegistry {
        failures: AtomicU32,
        delay: Option<Duration>,
        garbled: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn failing(times: u32) -> Self {
            Self {
                failures: AtomicU32::new(times),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn fail_once_more(&self) -> bool {
            self.failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl TaskDefinitionRegistry for FakeRegistry {
        async fn register(&self, document: &str) -> Result<Revision> {
            self.calls.lock().unwrap().push(format!("register {}", document.len()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.garbled {
                return parse_register_output(b"not json");
            }
            if self.fail_once_more() {
                return Err(EcsComposeError::Deploy("throttled".to_string()));
            }
            Ok(Revision {
                arn: "arn:aws:ecs:us-east-1:1:task-definition/site:3".to_string(),
                family: "site".to_string(),
                revision: 3,
            })
        }

        async fn update_service(
            &self,
            cluster: Option<&str>,
            service: &str,
            revision: &Revision,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(format!(
                "update {} {} {}",
                cluster.unwrap_or("-"),
                service,
                revision
            ));
            Ok(())
        }
    }

    fn quick() -> DeployOptions {
        DeployOptions {
            timeout: Duration::from_secs(5),
            retries: 2,
            retry_delay: Duration::from_millis(1),
        }
    }

    fn task() -> TaskDefinition {
        let manifest: Manifest = vec![("web", ServiceSpec::new("nginx", "64m"))]
            .into_iter()
            .collect();
        ManifestTranslator::generate("site", &manifest, None).unwrap()
    }

    #[tokio::test]
    async fn test_deploy_registers_and_updates() {
        let deployer = Deployer::new(FakeRegistry::default(), quick());
        let services = vec!["web".to_string(), "worker".to_string()];

        let revision = deployer.deploy(&task(), Some("prod"), &services).await.unwrap();
        assert_eq!(revision.task_definition(), "site:3");

        let calls = deployer.registry.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("register "));
        assert_eq!(calls[1], "update prod web site:3");
        assert_eq!(calls[2], "update prod worker site:3");
    }

    #[tokio::test]
    async fn test_register_retries_transient_failures() {
        let deployer = Deployer::new(FakeRegistry::failing(2), quick());

        let revision = deployer.register("{}").await.unwrap();
        assert_eq!(revision.revision, 3);
        assert_eq!(deployer.registry.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_register_gives_up_after_retries() {
        let deployer = Deployer::new(FakeRegistry::failing(5), quick());

        let err = deployer.register("{}").await.unwrap_err();
        assert!(matches!(err, EcsComposeError::Deploy(_)));
        assert!(!err.is_translation_error());
        assert_eq!(deployer.registry.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unreadable_register_output_not_retried() {
        let registry = FakeRegistry {
            garbled: true,
            ..Default::default()
        };
        let deployer = Deployer::new(registry, quick());

        let err = deployer.register("{}").await.unwrap_err();
        assert!(matches!(err, EcsComposeError::UnexpectedOutput(_)));
        assert_eq!(deployer.registry.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_register_times_out() {
        let registry = FakeRegistry {
            delay: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        let options = DeployOptions {
            timeout: Duration::from_millis(10),
            retries: 0,
            retry_delay: Duration::from_millis(1),
        };
        let deployer = Deployer::new(registry, options);

        let err = deployer.register("{}").await.unwrap_err();
        assert!(matches!(err, EcsComposeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_oversized_document_not_submitted() {
        let deployer = Deployer::new(FakeRegistry::default(), quick());
        let document = "x".repeat(MAX_TASK_DEFINITION_BYTES + 1);

        let err = deployer.register(&document).await.unwrap_err();
        assert!(matches!(
            err,
            EcsComposeError::PayloadTooLarge { size, limit }
                if size == MAX_TASK_DEFINITION_BYTES + 1 && limit == MAX_TASK_DEFINITION_BYTES
        ));
        assert!(deployer.registry.calls().is_empty());
    }
}
