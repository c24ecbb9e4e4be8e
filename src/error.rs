//! Error types for ecs-compose

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ecs-compose operations
pub type Result<T> = std::result::Result<T, EcsComposeError>;

/// ecs-compose error types
#[derive(Error, Debug)]
pub enum EcsComposeError {
    #[error("missing required field \"{field}\"")]
    RequiredFieldMissing { field: String },

    #[error("Unparsable memory limit: \"{0}\"")]
    UnparsableMemoryLimit(String),

    #[error("Unparsable port spec: \"{0}\"")]
    UnparsablePortSpec(String),

    #[error("{source} processing container \"{service}\"")]
    Service {
        service: String,
        source: Box<EcsComposeError>,
    },

    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    #[error("Failed to read {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No compose file found in {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Task definition is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Deploy error: {0}")]
    Deploy(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unexpected CLI output: {0}")]
    UnexpectedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EcsComposeError {
    /// Attach the name of the service being translated
    pub fn in_service(self, service: &str) -> Self {
        EcsComposeError::Service {
            service: service.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any service context removed
    pub fn root(&self) -> &EcsComposeError {
        match self {
            EcsComposeError::Service { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error came from translating the manifest rather than
    /// from loading it or talking to the control plane
    pub fn is_translation_error(&self) -> bool {
        matches!(
            self.root(),
            EcsComposeError::RequiredFieldMissing { .. }
                | EcsComposeError::UnparsableMemoryLimit(_)
                | EcsComposeError::UnparsablePortSpec(_)
                | EcsComposeError::ManifestParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_context_message() {
        let err = EcsComposeError::UnparsablePortSpec("abc".to_string()).in_service("web");
        assert_eq!(
            err.to_string(),
            "Unparsable port spec: \"abc\" processing container \"web\""
        );
        assert!(matches!(err.root(), EcsComposeError::UnparsablePortSpec(s) if s == "abc"));
        assert!(err.is_translation_error());
    }

    #[test]
    fn test_deploy_errors_are_not_translation_errors() {
        assert!(!EcsComposeError::Deploy("denied".to_string()).is_translation_error());
        assert!(!EcsComposeError::Timeout("register".to_string()).is_translation_error());
        assert!(!EcsComposeError::UnexpectedOutput("{".to_string()).is_translation_error());
    }

    #[test]
    fn test_manifest_read_is_not_translation_error() {
        let err = EcsComposeError::ManifestRead {
            path: PathBuf::from("/srv/compose.yml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Failed to read /srv/compose.yml: gone");
        assert!(!err.is_translation_error());
        assert!(!EcsComposeError::ManifestNotFound(PathBuf::from("/srv")).is_translation_error());
    }
}
