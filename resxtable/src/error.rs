//! All error types for the resxtable crate.
//!
//! Load failures, duplicate keys and persistence failures are errors. A refused
//! edit (the culture is not editable, the key is missing, the new key is taken)
//! is not: guarded operations report it as "not applied" through their return
//! value instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("`{path}` is not a valid resource file: {message}")]
    Malformed { path: String, message: String },

    #[error("`{path}` is not a valid resource file: the document has no root element")]
    MissingRoot { path: String },

    #[error("`{path}` is not a valid resource file: an entry is missing the `{attribute}` attribute")]
    MissingAttribute { path: String, attribute: String },

    #[error("`{path}` contains duplicate keys: {keys}")]
    DuplicateKeys { path: String, keys: String },

    #[error("failed to write `{path}`: {message}")]
    Persistence {
        path: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("configuration error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("invalid culture `{0}`")]
    InvalidCulture(String),
}

impl Error {
    /// Creates a load error for a document that could not be read as a resource file.
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a persistence error wrapping the underlying failure.
    pub fn persistence(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Persistence {
            path: path.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// True for the errors raised while loading a document.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::Malformed { .. }
                | Error::MissingRoot { .. }
                | Error::MissingAttribute { .. }
        )
    }
}
