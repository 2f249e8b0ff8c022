//! Error types for building and walking configuration trees.

use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing paths, assigning leaves or dispatching a tree.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The xpath string could not be split into nodes.
    #[error("Invalid xpath '{xpath}': {message}")]
    InvalidXPath {
        /// The offending path.
        xpath: String,
        /// What went wrong.
        message: String,
    },

    /// A keyed list entry was addressed without its key predicate.
    #[error("{node}@{key} not found. {path}")]
    MissingKey {
        /// The list node name.
        node: String,
        /// The missing key attribute.
        key: String,
        /// The node as written in the path.
        path: String,
    },

    /// A leaf value could not be parsed.
    #[error("Invalid {field}. {value}")]
    InvalidValue {
        /// Field or type name.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// A processor callback rejected a node.
    #[error(transparent)]
    Processor(Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
    /// Creates an invalid xpath error.
    pub fn invalid_xpath(xpath: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidXPath {
            xpath: xpath.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wraps an error raised by a processor callback.
    pub fn processor(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Processor(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::MissingKey {
            node: "neighbor".to_string(),
            key: "neighbor-address".to_string(),
            path: "neighbor".to_string(),
        };
        assert_eq!(err.to_string(), "neighbor@neighbor-address not found. neighbor");

        let err = ModelError::invalid_value("neighbor-address", "10.0.0");
        assert_eq!(err.to_string(), "Invalid neighbor-address. 10.0.0");
    }

    #[test]
    fn test_processor_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "emitter failed");
        assert_eq!(ModelError::processor(io).to_string(), "emitter failed");
    }
}
