//! Compose manifest types
//!
//! Only the subset of the compose schema that maps onto an ECS container
//! definition is modelled. Unknown service keys are ignored.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

/// A parsed manifest: services in declaration order
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    services: Vec<(String, ServiceSpec)>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service, replacing (in place) any service with the same name
    pub fn insert(&mut self, name: impl Into<String>, spec: ServiceSpec) -> Option<ServiceSpec> {
        let name = name.into();
        match self.services.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, spec)),
            None => {
                self.services.push((name, spec));
                None
            }
        }
    }

    /// Look up a service by name
    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// Iterate services in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceSpec)> {
        self.services.iter().map(|(n, spec)| (n.as_str(), spec))
    }

    /// Service names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ServiceSpec)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (S, ServiceSpec)>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for (name, spec) in iter {
            manifest.insert(name, spec);
        }
        manifest
    }
}

/// One service entry of the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Image name (required)
    #[serde(default)]
    pub image: Option<String>,
    /// Memory limit such as "512m" (required)
    #[serde(default)]
    pub mem_limit: Option<Scalar>,
    /// CPU shares
    #[serde(default)]
    pub cpu_shares: Option<u32>,
    /// Linked services
    #[serde(default)]
    pub links: Option<Vec<String>>,
    /// Port specs: 80 or "8080:80"
    #[serde(default)]
    pub ports: Option<Vec<Scalar>>,
    /// Environment variables
    #[serde(default)]
    pub environment: Option<EnvironmentConfig>,
    /// Entrypoint
    #[serde(default)]
    pub entrypoint: Option<CommandConfig>,
    /// Command to run
    #[serde(default)]
    pub command: Option<CommandConfig>,
}

impl ServiceSpec {
    /// Create a service with the two required fields set
    pub fn new(image: &str, mem_limit: &str) -> Self {
        Self {
            image: Some(image.to_string()),
            mem_limit: Some(Scalar::String(mem_limit.to_string())),
            ..Default::default()
        }
    }
}

/// A loosely-typed scalar as it appears in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    String(String),
    Null,
}

impl Scalar {
    /// Convert a YAML value, returning `None` for sequences and mappings
    pub fn from_value(value: &Value) -> Option<Scalar> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Integer(i)),
                None => match n.as_u64() {
                    Some(u) => Some(Scalar::Unsigned(u)),
                    None => n.as_f64().map(Scalar::Float),
                },
            },
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Tagged(tagged) => Scalar::from_value(&tagged.value),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Unsigned(u) => write!(f, "{}", u),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => f.write_str(s),
            Scalar::Null => Ok(()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

/// Command or entrypoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandConfig {
    /// Command line string, split on spaces
    Shell(String),
    /// Exec form array, used as-is
    Exec(Vec<String>),
}

/// Environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentConfig {
    /// Map of key to scalar value, in declaration order
    Map(serde_yaml::Mapping),
    /// Array of KEY=value strings
    Array(Vec<String>),
}
