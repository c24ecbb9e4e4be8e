//! ECS task definition document

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Upper bound on the serialized document accepted by the control plane
pub const MAX_TASK_DEFINITION_BYTES: usize = 64 * 1024;

/// Default CPU units for a container without `cpu_shares`
pub const DEFAULT_CPU_SHARES: u32 = 2;

/// Task definition (root of the document)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    /// Family grouping the revisions of this definition
    pub family: String,
    /// Containers, in manifest order
    pub container_definitions: Vec<ContainerDefinition>,
    /// Always empty
    pub volumes: Vec<Volume>,
}

impl TaskDefinition {
    /// Serialize without insignificant whitespace
    pub fn to_compact_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Look up a container by name
    pub fn container(&self, name: &str) -> Option<&ContainerDefinition> {
        self.container_definitions.iter().find(|c| c.name == name)
    }
}

/// One container of a task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    pub cpu: u32,
    /// Hard memory limit in MiB
    pub memory: u64,
    pub links: Vec<String>,
    pub port_mappings: Vec<PortMapping>,
    pub essential: bool,
    pub environment: Vec<EnvironmentVariable>,
    pub mount_points: Vec<MountPoint>,
    pub volumes_from: Vec<VolumeFrom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

/// Host to container port mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub host_port: u16,
    pub container_port: u16,
}

/// Environment variable; ECS only accepts string values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

/// Volume mounted into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountPoint {
    pub source_volume: String,
    pub container_path: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Volumes shared from another container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeFrom {
    pub source_container: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Task-level volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<VolumeHost>,
}

/// Host path backing a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeHost {
    pub source_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str) -> ContainerDefinition {
        ContainerDefinition {
            name: name.to_string(),
            image: "nginx".to_string(),
            cpu: DEFAULT_CPU_SHARES,
            memory: 128,
            links: Vec::new(),
            port_mappings: vec![PortMapping {
                host_port: 8080,
                container_port: 80,
            }],
            essential: true,
            environment: vec![EnvironmentVariable {
                name: "MODE".to_string(),
                value: "prod".to_string(),
            }],
            mount_points: Vec::new(),
            volumes_from: Vec::new(),
            entry_point: None,
            command: None,
        }
    }

    #[test]
    fn test_compact_json_field_order() {
        let task = TaskDefinition {
            family: "site".to_string(),
            container_definitions: vec![container("web")],
            volumes: Vec::new(),
        };

        let json = task.to_compact_json().unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"family":"site","containerDefinitions":[{"name":"web","image":"nginx","cpu":2,"memory":128,"#,
                r#""links":[],"portMappings":[{"hostPort":8080,"containerPort":80}],"essential":true,"#,
                r#""environment":[{"name":"MODE","value":"prod"}],"mountPoints":[],"volumesFrom":[]}],"volumes":[]}"#
            )
        );
    }

    #[test]
    fn test_entry_point_and_command_serialized_when_set() {
        let mut c = container("web");
        c.entry_point = Some(vec!["/bin/sh".to_string(), "-c".to_string()]);
        c.command = Some(vec!["true".to_string()]);

        let json = serde_json::to_string(&c).unwrap();
        assert!(json.ends_with(r#""entryPoint":["/bin/sh","-c"],"command":["true"]}"#));
    }

    #[test]
    fn test_container_lookup() {
        let task = TaskDefinition {
            family: "site".to_string(),
            container_definitions: vec![container("web"), container("db")],
            volumes: Vec::new(),
        };

        assert!(task.container("db").is_some());
        assert!(task.container("cache").is_none());
    }
}
