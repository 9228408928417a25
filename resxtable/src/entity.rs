//! All cultures of one resource base name.

use std::{collections::HashSet, path::Path};

use crate::{
    culture::{CultureKey, ResourceFileName},
    error::Error,
    language::{LanguageContext, ResourceLanguage},
    store::{DocumentStore, FileStore},
    xml::XmlDocument,
};

/// The documents sharing one base name, e.g. `Resources.resx`,
/// `Resources.de.resx` and `Resources.fr-CA.resx`.
///
/// The first language is the neutral language. Key-level operations are fed
/// to every culture so the documents stay consistent with each other.
#[derive(Debug)]
pub struct ResourceEntity {
    base_name: String,
    languages: Vec<ResourceLanguage>,
    context: LanguageContext,
}

impl ResourceEntity {
    /// Creates an entity without any language.
    pub fn new(base_name: impl Into<String>, context: LanguageContext) -> Self {
        Self {
            base_name: base_name.into(),
            languages: Vec::new(),
            context,
        }
    }

    /// Loads one document per culture, neutral culture first.
    pub fn load<S, I>(base_name: impl Into<String>, files: I, context: LanguageContext) -> Result<Self, Error>
    where
        S: DocumentStore + 'static,
        I: IntoIterator<Item = (CultureKey, S)>,
    {
        let mut files: Vec<(CultureKey, S)> = files.into_iter().collect();
        files.sort_by(|(left, _), (right, _)| left.cmp(right));

        let mut entity = Self::new(base_name, context);
        for (culture, store) in files {
            entity.load_language(culture, store)?;
        }
        Ok(entity)
    }

    /// Loads the resource files at `paths`, which must share one base name.
    ///
    /// # Parameters
    ///
    /// - `paths`: resource files in any order; the culture of each is taken
    ///   from its file name (`Strings.de.resx`).
    /// - `context`: collaborators shared by all loaded documents.
    ///
    /// # Returns
    ///
    /// The entity, or the first load error. Mixed base names are rejected.
    pub fn from_paths<P, I>(paths: I, context: LanguageContext) -> Result<Self, Error>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        let mut base_name: Option<String> = None;
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let name = ResourceFileName::parse(path).ok_or_else(|| {
                Error::InvalidResource(format!("`{}` is not a resource file", path.display()))
            })?;
            match &base_name {
                Some(existing) if *existing != name.base_name => {
                    return Err(Error::InvalidResource(format!(
                        "`{}` does not belong to `{}`",
                        path.display(),
                        existing
                    )));
                }
                Some(_) => {}
                None => base_name = Some(name.base_name.clone()),
            }
            files.push((name.culture, FileStore::new(path)));
        }

        let base_name = base_name
            .ok_or_else(|| Error::InvalidResource("no resource files given".to_string()))?;
        Self::load(base_name, files, context)
    }

    /// Loads one more culture. On failure the entity is left as it was.
    ///
    /// The first language loaded becomes the neutral language.
    pub fn load_language(
        &mut self,
        culture: CultureKey,
        store: impl DocumentStore + 'static,
    ) -> Result<&ResourceLanguage, Error> {
        if self.language(&culture).is_some() {
            return Err(Error::InvalidResource(format!(
                "culture `{}` of `{}` is already loaded",
                culture, self.base_name
            )));
        }

        let neutral = self.languages.is_empty();
        let language = ResourceLanguage::load(culture, store, neutral, self.context.clone())?;
        self.languages.push(language);
        Ok(&self.languages[self.languages.len() - 1])
    }

    /// Creates the document of a new culture from the empty resource
    /// template, saves it and adds it to the entity.
    pub fn add_language(
        &mut self,
        culture: CultureKey,
        store: impl DocumentStore + 'static,
    ) -> Result<&ResourceLanguage, Error> {
        if self.language(&culture).is_some() {
            return Err(Error::InvalidResource(format!(
                "culture `{}` of `{}` is already loaded",
                culture, self.base_name
            )));
        }
        let document = XmlDocument::empty_resx()?;
        store
            .save(&document)
            .map_err(|e| Error::persistence(store.location(), e))?;

        tracing::info!(base_name = %self.base_name, culture = %culture, "added language");
        self.load_language(culture, store)
    }

    /// The file name without culture and extension.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// All loaded languages, neutral first.
    pub fn languages(&self) -> &[ResourceLanguage] {
        &self.languages
    }

    /// The neutral language, `None` while nothing is loaded.
    pub fn neutral_language(&self) -> Option<&ResourceLanguage> {
        self.languages.first()
    }

    /// Cultures in language order.
    pub fn cultures(&self) -> impl Iterator<Item = &CultureKey> {
        self.languages.iter().map(ResourceLanguage::culture)
    }

    /// The language of `culture`, if loaded.
    pub fn language(&self, culture: &CultureKey) -> Option<&ResourceLanguage> {
        self.languages
            .iter()
            .find(|language| language.culture() == culture)
    }

    /// Mutable access to the language of `culture`.
    pub fn language_mut(&mut self, culture: &CultureKey) -> Option<&mut ResourceLanguage> {
        self.languages
            .iter_mut()
            .find(|language| language.culture() == culture)
    }

    /// Every key of every culture, in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.languages
            .iter()
            .flat_map(ResourceLanguage::keys)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// True if any culture has `key`.
    pub fn key_exists(&self, key: &str) -> bool {
        self.languages.iter().any(|language| language.key_exists(key))
    }

    /// Renames `old_key` in every culture that has it.
    ///
    /// # Parameters
    ///
    /// - `old_key`: the key to rename
    /// - `new_key`: the replacement, which must not exist in any culture
    ///
    /// # Returns
    ///
    /// `false` if nothing was renamed: `new_key` is empty or taken, no culture
    /// has `old_key`, or a culture holding it cannot be edited.
    pub fn rename_key(&mut self, old_key: &str, new_key: &str) -> bool {
        if new_key.is_empty() || self.key_exists(new_key) || !self.can_edit_key(old_key) {
            return false;
        }

        let mut applied = false;
        for language in &mut self.languages {
            if language.key_exists(old_key) {
                applied |= language.rename_key(old_key, new_key);
            }
        }
        applied
    }

    /// Removes `key` from every culture. Not applied if a culture holding the
    /// key cannot be edited.
    pub fn remove_key(&mut self, key: &str) -> bool {
        if !self.can_edit_key(key) {
            return false;
        }

        let mut applied = false;
        for language in &mut self.languages {
            applied |= language.remove_key(key);
        }
        applied
    }

    /// Moves `key` behind the first of `preceding` in every culture.
    pub fn move_entry(&mut self, key: &str, preceding: &[&str]) -> bool {
        let mut applied = false;
        for language in &mut self.languages {
            applied |= language.move_node(key, preceding.iter().copied());
        }
        applied
    }

    fn can_edit_key(&self, key: &str) -> bool {
        self.languages
            .iter()
            .filter(|language| language.key_exists(key))
            .all(ResourceLanguage::can_edit)
    }

    /// True if any document has unsaved changes.
    pub fn has_changes(&self) -> bool {
        self.languages.iter().any(ResourceLanguage::has_changes)
    }

    /// Saves every changed document, stopping at the first failure.
    pub fn save_all(&mut self) -> Result<(), Error> {
        for language in &mut self.languages {
            if language.has_changes() {
                language.save(false)?;
            }
        }
        Ok(())
    }
}
