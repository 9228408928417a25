//! Load/save collaborators for resource documents.
//!
//! A [`crate::ResourceLanguage`] only touches its backing storage when it is
//! constructed and when it is saved. Everything in between happens on the
//! in-memory [`XmlDocument`].

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{error::Error, traits::Parser, xml::XmlDocument};

/// Where a resource document is loaded from and saved to.
pub trait DocumentStore: Send {
    /// Human-readable location used in error messages (usually the file path).
    fn location(&self) -> &str;

    /// Loads and parses the document. Parse failures are load errors naming
    /// [`DocumentStore::location`].
    fn load(&self) -> Result<XmlDocument, Error>;

    /// Writes the document back.
    fn save(&self, document: &XmlDocument) -> Result<(), Error>;
}

/// A document stored in a file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    location: String,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let location = path.display().to_string();
        Self { path, location }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn load(&self) -> Result<XmlDocument, Error> {
        XmlDocument::read_from(&self.path).map_err(|e| at_location(e, &self.location))
    }

    fn save(&self, document: &XmlDocument) -> Result<(), Error> {
        document.write_to(&self.path)
    }
}

/// A document held in a shared in-memory buffer.
///
/// Clones share the same buffer, so a test can keep one handle and inspect
/// what a document saved through another.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    location: String,
    content: Arc<Mutex<String>>,
}

impl MemoryStore {
    pub fn new(location: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            content: Arc::new(Mutex::new(content.into())),
        }
    }

    /// The current buffer content.
    pub fn contents(&self) -> Result<String, Error> {
        let content = self
            .content
            .lock()
            .map_err(|e| Error::InvalidResource(e.to_string()))?;
        Ok(content.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn load(&self) -> Result<XmlDocument, Error> {
        let content = self.contents()?;
        XmlDocument::from_str(&content).map_err(|e| at_location(e, &self.location))
    }

    fn save(&self, document: &XmlDocument) -> Result<(), Error> {
        let serialized = document.to_xml_string()?;
        let mut content = self
            .content
            .lock()
            .map_err(|e| Error::InvalidResource(e.to_string()))?;
        *content = serialized;
        Ok(())
    }
}

/// Fills in the document location on load errors raised by the parser.
fn at_location(error: Error, location: &str) -> Error {
    match error {
        Error::Malformed { message, .. } => Error::malformed(location, message),
        Error::MissingRoot { .. } => Error::MissingRoot {
            path: location.to_string(),
        },
        other => other,
    }
}
