//! Compose manifest to ECS task definition translation

use super::fields::{command_args, convert_environment, parse_memory_limit, parse_port_mapping};
use super::task_definition::{ContainerDefinition, TaskDefinition, DEFAULT_CPU_SHARES};
use crate::compose::config::{Manifest, ServiceSpec};
use crate::error::{EcsComposeError, Result};
use std::collections::HashSet;

/// Translates a [`Manifest`] into a [`TaskDefinition`].
///
/// Translation is pure: the same manifest always yields the same document,
/// and the first failing service aborts the whole translation.
pub struct ManifestTranslator;

impl ManifestTranslator {
    /// Build the task definition for `family`.
    ///
    /// When `service_filter` is given, only services named in it are kept.
    /// Every service is still translated (and validated) first.
    pub fn generate(
        family: &str,
        manifest: &Manifest,
        service_filter: Option<&HashSet<String>>,
    ) -> Result<TaskDefinition> {
        let mut containers = Vec::with_capacity(manifest.len());

        for (name, spec) in manifest.iter() {
            let container = Self::container_definition(name, spec).map_err(|e| e.in_service(name))?;
            tracing::debug!("Translated service {} ({} MiB)", name, container.memory);
            containers.push(container);
        }

        if let Some(filter) = service_filter {
            containers.retain(|c| filter.contains(&c.name));
        }

        Ok(TaskDefinition {
            family: family.to_string(),
            container_definitions: containers,
            volumes: Vec::new(),
        })
    }

    /// Build the task definition and serialize it compactly
    pub fn render(
        family: &str,
        manifest: &Manifest,
        service_filter: Option<&HashSet<String>>,
    ) -> Result<String> {
        Self::generate(family, manifest, service_filter)?.to_compact_json()
    }

    fn container_definition(name: &str, spec: &ServiceSpec) -> Result<ContainerDefinition> {
        let image = spec.image.clone().ok_or_else(|| missing("image"))?;
        let mem_limit = spec.mem_limit.as_ref().ok_or_else(|| missing("mem_limit"))?;

        let port_mappings = spec
            .ports
            .iter()
            .flatten()
            .map(parse_port_mapping)
            .collect::<Result<Vec<_>>>()?;

        Ok(ContainerDefinition {
            name: name.to_string(),
            image,
            cpu: spec.cpu_shares.unwrap_or(DEFAULT_CPU_SHARES),
            memory: parse_memory_limit(mem_limit)?,
            links: spec.links.clone().unwrap_or_default(),
            port_mappings,
            essential: true,
            environment: convert_environment(spec.environment.as_ref())?,
            mount_points: Vec::new(),
            volumes_from: Vec::new(),
            entry_point: spec.entrypoint.as_ref().map(command_args),
            command: spec.command.as_ref().map(command_args),
        })
    }
}

fn missing(field: &str) -> EcsComposeError {
    EcsComposeError::RequiredFieldMissing {
        field: field.to_string(),
    }
}
