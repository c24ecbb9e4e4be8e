//! ECS task definition output
//!
//! [`ManifestTranslator`] turns a compose [`Manifest`](crate::compose::Manifest)
//! into a [`TaskDefinition`] using the converters in [`fields`].

pub mod fields;
pub mod task_definition;
pub mod translator;

pub use task_definition::{
    ContainerDefinition, EnvironmentVariable, PortMapping, TaskDefinition,
    MAX_TASK_DEFINITION_BYTES,
};
pub use translator::ManifestTranslator;
