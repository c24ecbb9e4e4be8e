//! Field converters from compose values to ECS values

use super::task_definition::{EnvironmentVariable, PortMapping};
use crate::compose::config::{CommandConfig, EnvironmentConfig, Scalar};
use crate::error::{EcsComposeError, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;

const BYTES_PER_MIB: u64 = 1024 * 1024;
const KIB_PER_MIB: u64 = 1024;
const MIB_PER_GIB: u64 = 1024;

static MEMORY_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([bkmgBKMG])$").unwrap());

static PORT_PATTERNS: LazyLock<Vec<(PortShape, Regex)>> = LazyLock::new(|| {
    vec![
        (PortShape::Single, Regex::new(r"^([0-9]+)$").unwrap()),
        (PortShape::HostContainer, Regex::new(r"^([0-9]+):([0-9]+)$").unwrap()),
    ]
});

/// Unit suffix of a memory limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryUnit {
    Bytes,
    Kibibytes,
    Mebibytes,
    Gibibytes,
}

impl MemoryUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "b" => Some(MemoryUnit::Bytes),
            "k" => Some(MemoryUnit::Kibibytes),
            "m" => Some(MemoryUnit::Mebibytes),
            "g" => Some(MemoryUnit::Gibibytes),
            _ => None,
        }
    }

    /// Convert to MiB, rounding up
    fn to_mebibytes(self, value: u64) -> Option<u64> {
        match self {
            MemoryUnit::Bytes => Some(value.div_ceil(BYTES_PER_MIB)),
            MemoryUnit::Kibibytes => Some(value.div_ceil(KIB_PER_MIB)),
            MemoryUnit::Mebibytes => Some(value),
            MemoryUnit::Gibibytes => value.checked_mul(MIB_PER_GIB),
        }
    }
}

/// Parse a Docker memory literal ("512m", "1g") into whole MiB, rounded up.
///
/// The unit suffix is mandatory and the result must be at least 1 MiB.
pub fn parse_memory_limit(limit: &Scalar) -> Result<u64> {
    let raw = limit.to_string();
    let unparsable = || EcsComposeError::UnparsableMemoryLimit(raw.clone());

    let caps = MEMORY_LIMIT.captures(&raw).ok_or_else(unparsable)?;
    let value: u64 = caps[1].parse().map_err(|_| unparsable())?;
    let unit = MemoryUnit::from_suffix(&caps[2]).ok_or_else(unparsable)?;

    match unit.to_mebibytes(value) {
        Some(mib) if mib > 0 => Ok(mib),
        _ => Err(unparsable()),
    }
}

/// Accepted port spec shapes, tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortShape {
    /// "80": same port on host and container
    Single,
    /// "8080:80"
    HostContainer,
}

impl PortShape {
    fn mapping(self, caps: &Captures) -> Option<PortMapping> {
        match self {
            PortShape::Single => {
                let port = caps[1].parse().ok()?;
                Some(PortMapping {
                    host_port: port,
                    container_port: port,
                })
            }
            PortShape::HostContainer => Some(PortMapping {
                host_port: caps[1].parse().ok()?,
                container_port: caps[2].parse().ok()?,
            }),
        }
    }
}

/// Parse a port spec (`80` or `"8080:80"`) into a host/container pair
pub fn parse_port_mapping(spec: &Scalar) -> Result<PortMapping> {
    let raw = spec.to_string();

    for (shape, pattern) in PORT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&raw) {
            return shape
                .mapping(&caps)
                .ok_or_else(|| EcsComposeError::UnparsablePortSpec(raw.clone()));
        }
    }

    Err(EcsComposeError::UnparsablePortSpec(raw))
}

/// Split a command line on spaces.
///
/// There is no quoting or escaping: `sh -c "echo hi"` yields four tokens.
pub fn split_command(line: &str) -> Vec<String> {
    line.split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve an entrypoint/command value into its argument vector
pub fn command_args(command: &CommandConfig) -> Vec<String> {
    match command {
        CommandConfig::Shell(line) => split_command(line),
        CommandConfig::Exec(args) => args.clone(),
    }
}

/// Convert compose environment into ECS name/value pairs, keeping order
pub fn convert_environment(environment: Option<&EnvironmentConfig>) -> Result<Vec<EnvironmentVariable>> {
    let Some(environment) = environment else {
        return Ok(Vec::new());
    };

    match environment {
        EnvironmentConfig::Map(map) => map
            .iter()
            .map(|(key, value)| -> Result<EnvironmentVariable> {
                let name = Scalar::from_value(key).ok_or_else(|| {
                    EcsComposeError::ManifestParse(
                        "environment keys must be scalars".to_string(),
                    )
                })?;
                let value = Scalar::from_value(value).ok_or_else(|| {
                    EcsComposeError::ManifestParse(format!(
                        "environment value for \"{}\" must be a scalar",
                        name
                    ))
                })?;

                Ok(EnvironmentVariable {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            })
            .collect(),
        EnvironmentConfig::Array(entries) => Ok(entries
            .iter()
            .map(|entry| {
                let (name, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                EnvironmentVariable {
                    name: name.to_string(),
                    value: value.to_string(),
                }
            })
            .collect()),
    }
}
