#![forbid(unsafe_code)]
//! Keyed, culture-aware editing of `.resx` resource documents.
//!
//! Each culture of a resource file is loaded into a [`ResourceLanguage`]: an
//! index of its string entries over the original document, so that edits
//! preserve everything else in the file (headers, schema, binary entries,
//! designer members, comments).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resxtable::{CultureKey, FileStore, LanguageContext, ResourceLanguage};
//!
//! let mut language = ResourceLanguage::load(
//!     CultureKey::parse("de")?,
//!     FileStore::new("Properties/Resources.de.resx"),
//!     false,
//!     LanguageContext::default(),
//! )?;
//! language.set_value("Greeting", "Hallo")?;
//! language.save(false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - Guarded edits: every mutation asks an [`EditPolicy`] first and reports
//!   "not applied" instead of failing
//! - Duplicate keys are rejected or renamed on load, per [`Configuration`]
//! - Optional sort-on-save with configurable key comparison
//! - Translation candidates ranked by rating, fed from concurrent backends
//!   through a [`Session`]
//! - Code reference rules describing how keys are referenced from source files

pub mod code_reference;
pub mod configuration;
pub mod culture;
pub mod entity;
pub mod error;
pub mod events;
pub mod language;
pub mod session;
pub mod store;
pub mod traits;
pub mod translation;
pub mod xml;

// Re-export most used types for easy consumption
pub use crate::{
    code_reference::{RuleItem, RuleSet},
    configuration::{Configuration, DuplicateKeyHandling, SortComparison},
    culture::{CultureKey, ResourceFileName},
    entity::ResourceEntity,
    error::Error,
    events::{AlwaysEditable, EditPolicy, EventSink, LanguageEvent, NullSink},
    language::{LanguageContext, ResourceEntry, ResourceLanguage, ResourceNode},
    session::{Session, TranslationRequest, Translator, rating_from_scale},
    store::{DocumentStore, FileStore, MemoryStore},
    translation::{TranslationItem, TranslationMatch, TranslatorInfo},
    xml::XmlDocument,
};
