//! Collaborators a resource document reports to.
//!
//! A document never reaches up into its owner. It asks an [`EditPolicy`]
//! before every mutation and reports what happened through an [`EventSink`],
//! typically the sending half of a channel the owning table drains.

use std::sync::mpsc::Sender;

use crate::culture::CultureKey;

/// Decides whether a culture may currently be edited.
pub trait EditPolicy: Send + Sync {
    fn can_edit(&self, culture: &CultureKey) -> bool;
}

impl<F> EditPolicy for F
where
    F: Fn(&CultureKey) -> bool + Send + Sync,
{
    fn can_edit(&self, culture: &CultureKey) -> bool {
        self(culture)
    }
}

/// Every culture is editable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEditable;

impl EditPolicy for AlwaysEditable {
    fn can_edit(&self, _culture: &CultureKey) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageEvent {
    /// A mutation was applied to the document of `culture`.
    Changed { culture: CultureKey },
    /// A write failed; `message` is meant for the user.
    Failed {
        culture: CultureKey,
        location: String,
        message: String,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: LanguageEvent);
}

impl EventSink for Sender<LanguageEvent> {
    fn emit(&self, event: LanguageEvent) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LanguageEvent) {}
}
