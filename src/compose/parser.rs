//! Compose manifest parser

use super::config::{Manifest, Scalar, ServiceSpec};
use crate::error::{EcsComposeError, Result};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Default manifest file names, in lookup order
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Manifest parser
pub struct ManifestParser;

impl ManifestParser {
    /// Find manifest file in directory
    pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
        for name in DEFAULT_COMPOSE_FILES {
            let path = dir.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Parse manifest file from path
    pub fn parse_file(path: &Path) -> Result<Manifest> {
        let content =
            std::fs::read_to_string(path).map_err(|source| EcsComposeError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Parsing manifest {}", path.display());
        Self::parse_str(&content)
    }

    /// Parse manifest from YAML or JSON text
    pub fn parse_str(content: &str) -> Result<Manifest> {
        if content.trim().is_empty() {
            return Ok(Manifest::new());
        }

        let root: Value = serde_yaml::from_str(content)
            .map_err(|e| EcsComposeError::ManifestParse(format!("Failed to parse YAML: {}", e)))?;

        Self::from_value(root)
    }

    /// Build a manifest from an already-parsed YAML document
    pub fn from_value(root: Value) -> Result<Manifest> {
        let root = match root {
            Value::Mapping(map) => map,
            Value::Null => return Ok(Manifest::new()),
            _ => {
                return Err(EcsComposeError::ManifestParse(
                    "Top level of the manifest must be a mapping of services".to_string(),
                ))
            }
        };

        let services = Self::services_mapping(root);

        let mut manifest = Manifest::new();
        for (key, value) in services {
            let name = match Scalar::from_value(&key) {
                Some(Scalar::Null) | None => {
                    return Err(EcsComposeError::ManifestParse(
                        "Service names must be non-empty scalars".to_string(),
                    ))
                }
                Some(scalar) => scalar.to_string(),
            };

            let spec: ServiceSpec = match value {
                Value::Null => ServiceSpec::default(),
                value => serde_yaml::from_value(value).map_err(|e| {
                    EcsComposeError::ManifestParse(e.to_string()).in_service(&name)
                })?,
            };

            manifest.insert(name, spec);
        }

        Ok(manifest)
    }

    /// Select the mapping that holds the services.
    ///
    /// Version 1 manifests list services at the top level. Later versions
    /// nest them under `services:`. A top-level `services` mapping is that
    /// section when a `version` key is present, or when every entry in it is
    /// itself a mapping (or empty). Any scalar or list entry, like `image` or
    /// `mem_limit`, marks it as a version 1 service named `services`.
    fn services_mapping(mut root: Mapping) -> Mapping {
        let has_version = root.contains_key("version");
        let nested = match root.get("services") {
            Some(Value::Mapping(inner)) => {
                has_version
                    || inner
                        .values()
                        .all(|v| matches!(v, Value::Mapping(_) | Value::Null))
            }
            _ => false,
        };

        if nested {
            if let Some(Value::Mapping(services)) = root.remove("services") {
                return services;
            }
        }

        root
    }
}
