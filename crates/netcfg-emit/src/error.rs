//! Error types for the emitters.

use netcfg_model::ModelError;
use thiserror::Error;

/// Result type alias for emitter operations.
pub type EmitResult<T> = Result<T, EmitError>;

/// Errors raised while translating a tree into backend syntax.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The backend has no syntax for this value.
    #[error("Unsupported {field}: {value}")]
    Unsupported {
        /// The leaf being translated.
        field: String,
        /// The value the backend cannot express.
        value: String,
    },

    /// A leaf marked changed carries no value.
    #[error("Missing {field} in {node}")]
    Missing {
        /// The leaf without a value.
        field: String,
        /// Where the leaf lives.
        node: String,
    },

    /// A gobgpd document could not be parsed or written.
    #[error("Invalid {what}: {message}")]
    Document {
        /// Which document failed.
        what: String,
        /// Parser or serializer message.
        message: String,
    },
}

impl EmitError {
    /// Creates an unsupported value error.
    pub fn unsupported(field: impl Into<String>, value: impl ToString) -> Self {
        Self::Unsupported {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Creates a document error.
    pub fn document(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Document {
            what: what.into(),
            message: err.to_string(),
        }
    }

    /// Creates a missing value error.
    pub fn missing(field: impl Into<String>, node: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
            node: node.into(),
        }
    }
}

impl From<EmitError> for ModelError {
    fn from(err: EmitError) -> Self {
        ModelError::processor(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmitError::unsupported("network-type", "OSPF_NETWORK_TYPE");
        assert_eq!(err.to_string(), "Unsupported network-type: OSPF_NETWORK_TYPE");

        let err = EmitError::missing("router-id", "ospfv2/global/config");
        assert_eq!(err.to_string(), "Missing router-id in ospfv2/global/config");
    }

    #[test]
    fn test_into_model_error() {
        let err: ModelError = EmitError::unsupported("next-hop", "LOCAL_LINK").into();
        assert_eq!(err.to_string(), "Unsupported next-hop: LOCAL_LINK");
        assert!(matches!(err, ModelError::Processor(_)));
    }
}
