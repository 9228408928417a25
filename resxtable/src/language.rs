//! One culture's resource document, addressed by key.
//!
//! A [`ResourceLanguage`] loads a resource file into an ordered sequence of
//! top-level slots. String entries become [`ResourceNode`]s and are indexed by
//! key; everything else (headers, schema, binary data, designer members,
//! comments) is kept as opaque markup so it survives a save untouched.
//!
//! Every mutation goes through the same guard: the culture must be editable,
//! otherwise nothing happens and the call reports "not applied".

use std::{
    cell::OnceCell,
    collections::HashMap,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    mem,
    sync::Arc,
};

use crate::{
    configuration::{Configuration, DuplicateKeyHandling, SortComparison},
    culture::CultureKey,
    error::Error,
    events::{AlwaysEditable, EditPolicy, EventSink, LanguageEvent, NullSink},
    store::DocumentStore,
    xml::{Element, ExpandedName, XmlDocument, XmlNode},
};

/// Keys generated by the WinForms designer start with this prefix.
pub const WINFORMS_MEMBER_PREFIX: &str = ">>";

const NAME_ATTRIBUTE: &str = "name";
const TYPE_ATTRIBUTE: &str = "type";
const MIMETYPE_ATTRIBUTE: &str = "mimetype";
const SPACE_ATTRIBUTE: &str = "xml:space";

/// Element names of one document, resolved against its default namespace.
#[derive(Debug, Clone)]
struct EntryNames {
    data: ExpandedName,
    value: ExpandedName,
    comment: ExpandedName,
}

impl EntryNames {
    fn resolve(root: &Element) -> Self {
        let namespace = root.default_namespace();
        Self {
            data: ExpandedName::new(namespace, "data"),
            value: ExpandedName::new(namespace, "value"),
            comment: ExpandedName::new(namespace, "comment"),
        }
    }
}

/// One key/text/comment entry, backed by its `<data>` element.
///
/// The element is the source of truth. Text and comment are read from it on
/// first access and cached; every write updates element and cache together.
pub struct ResourceNode {
    element: Element,
    names: Arc<EntryNames>,
    text: OnceCell<String>,
    comment: OnceCell<String>,
}

impl ResourceNode {
    fn new(element: Element, names: Arc<EntryNames>) -> Self {
        Self {
            element,
            names,
            text: OnceCell::new(),
            comment: OnceCell::new(),
        }
    }

    /// The `name` attribute of the entry.
    pub fn key(&self) -> &str {
        self.element.attribute(NAME_ATTRIBUTE).unwrap_or_default()
    }

    fn set_key(&mut self, key: &str) {
        self.element.set_attribute(NAME_ATTRIBUTE, key);
    }

    /// The text of the `<value>` child, empty if there is none.
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| {
            self.element
                .child(&self.names.value)
                .and_then(Element::first_text)
                .unwrap_or_default()
                .to_string()
        })
    }

    /// The text of the `<comment>` child, empty if there is none.
    pub fn comment(&self) -> &str {
        self.comment.get_or_init(|| {
            self.element
                .child(&self.names.comment)
                .and_then(Element::first_text)
                .unwrap_or_default()
                .to_string()
        })
    }

    /// The backing `<data>` element.
    pub fn element(&self) -> &Element {
        &self.element
    }

    fn set_text(&mut self, text: &str) {
        let names = &self.names;
        match self.element.child_mut(&names.value) {
            Some(value) => value.replace_first_with_text(text),
            None => {
                let mut value = Element::new(&names.value);
                value.push(XmlNode::Text(text.to_string()));
                self.element.push(XmlNode::Element(value));
            }
        }
        self.text = OnceCell::from(text.to_string());
    }

    /// Blank comments remove the comment element altogether.
    fn set_comment(&mut self, comment: &str) {
        let names = &self.names;
        if comment.trim().is_empty() {
            self.element.remove_child(&names.comment);
            self.comment = OnceCell::from(String::new());
            return;
        }

        match self.element.child_mut(&names.comment) {
            Some(element) => match element.children.first_mut() {
                Some(XmlNode::Text(text)) | Some(XmlNode::CData(text)) => {
                    *text = comment.to_string()
                }
                _ => element
                    .children
                    .insert(0, XmlNode::Text(comment.to_string())),
            },
            None => {
                let mut element = Element::new(&names.comment);
                element.push(XmlNode::Text(comment.to_string()));
                self.element.push(XmlNode::Element(element));
            }
        }
        self.comment = OnceCell::from(comment.to_string());
    }
}

impl Debug for ResourceNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceNode")
            .field("key", &self.key())
            .field("text", &self.text.get())
            .field("comment", &self.comment.get())
            .finish()
    }
}

/// A top-level child of the document root.
#[derive(Debug)]
enum Slot {
    Markup(XmlNode),
    Entry(ResourceNode),
}

impl Slot {
    fn entry(&self) -> Option<&ResourceNode> {
        match self {
            Slot::Entry(node) => Some(node),
            Slot::Markup(_) => None,
        }
    }

    /// The `name` attribute of any `<data>` element, string entry or not.
    fn data_name(&self, names: &EntryNames) -> Option<&str> {
        match self {
            Slot::Entry(node) => Some(node.key()),
            Slot::Markup(XmlNode::Element(element)) if element.is(&names.data) => {
                Some(element.attribute(NAME_ATTRIBUTE).unwrap_or_default())
            }
            Slot::Markup(_) => None,
        }
    }

    fn to_node(&self) -> XmlNode {
        match self {
            Slot::Markup(node) => node.clone(),
            Slot::Entry(node) => XmlNode::Element(node.element.clone()),
        }
    }
}

/// A borrowed view of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEntry<'a> {
    pub key: &'a str,
    pub text: &'a str,
    pub comment: &'a str,
}

/// The collaborators shared by the documents of one resource table.
#[derive(Clone)]
pub struct LanguageContext {
    pub configuration: Arc<Configuration>,
    pub edit_policy: Arc<dyn EditPolicy>,
    pub events: Arc<dyn EventSink>,
}

impl LanguageContext {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration: Arc::new(configuration),
            edit_policy: Arc::new(AlwaysEditable),
            events: Arc::new(NullSink),
        }
    }

    pub fn with_edit_policy(mut self, policy: impl EditPolicy + 'static) -> Self {
        self.edit_policy = Arc::new(policy);
        self
    }

    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Arc::new(events);
        self
    }
}

impl Default for LanguageContext {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl Debug for LanguageContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageContext")
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

/// The resource document of one culture.
///
/// Two documents are equal when they have the same culture.
pub struct ResourceLanguage {
    culture: CultureKey,
    store: Box<dyn DocumentStore>,
    // Root children live in `slots` while the document is loaded.
    document: XmlDocument,
    names: Arc<EntryNames>,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    neutral: bool,
    has_changes: bool,
    context: LanguageContext,
}

impl ResourceLanguage {
    /// Loads the document of `culture` from `store`.
    ///
    /// # Parameters
    ///
    /// - `culture`: the culture the document holds
    /// - `store`: where the document is read from and later saved to
    /// - `neutral`: whether this is the neutral language of its table; neutral
    ///   entries are kept when they become empty
    /// - `context`: configuration, edit policy and event sink
    ///
    /// Only string entries are indexed: `<data>` elements whose `type` is
    /// absent, empty or a string type, or that have no `type` and no
    /// `mimetype`. Designer members (`>>` prefix) are skipped. Duplicate keys
    /// are renamed or rejected according to the configuration.
    pub fn load(
        culture: CultureKey,
        store: impl DocumentStore + 'static,
        neutral: bool,
        context: LanguageContext,
    ) -> Result<Self, Error> {
        let mut document = store.load()?;
        let names = Arc::new(EntryNames::resolve(&document.root));

        let mut slots = Vec::with_capacity(document.root.children.len());
        for child in mem::take(&mut document.root.children) {
            let slot = match child {
                XmlNode::Element(element) if element.is(&names.data) && is_string_type(&element) => {
                    let key = element.attribute(NAME_ATTRIBUTE).ok_or_else(|| {
                        Error::MissingAttribute {
                            path: store.location().to_string(),
                            attribute: NAME_ATTRIBUTE.to_string(),
                        }
                    })?;
                    if key.starts_with(WINFORMS_MEMBER_PREFIX) {
                        Slot::Markup(XmlNode::Element(element))
                    } else {
                        Slot::Entry(ResourceNode::new(element, Arc::clone(&names)))
                    }
                }
                other => Slot::Markup(other),
            };
            slots.push(slot);
        }

        if context.configuration.duplicate_key_handling == DuplicateKeyHandling::Rename {
            make_keys_unique(&mut slots, store.location());
        }

        let index = build_index(&slots).map_err(|keys| Error::DuplicateKeys {
            path: store.location().to_string(),
            keys,
        })?;

        tracing::debug!(
            location = store.location(),
            culture = %culture,
            entries = index.len(),
            "loaded resource document"
        );

        Ok(Self {
            culture,
            store: Box::new(store),
            document,
            names,
            slots,
            index,
            neutral,
            has_changes: false,
            context,
        })
    }

    /// The culture of this document.
    pub fn culture(&self) -> &CultureKey {
        &self.culture
    }

    /// `Neutral` for the neutral culture, the language tag otherwise.
    pub fn display_name(&self) -> String {
        if self.culture.is_neutral() {
            "Neutral".to_string()
        } else {
            self.culture.to_string()
        }
    }

    /// Where the document is loaded from and saved to.
    pub fn location(&self) -> &str {
        self.store.location()
    }

    /// The neutral language is never pruned when its entries become empty.
    pub fn is_neutral(&self) -> bool {
        self.neutral
    }

    /// True if a mutation happened since the last successful save.
    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Asks the edit policy whether this culture may be changed.
    pub fn can_edit(&self) -> bool {
        self.context.edit_policy.can_edit(&self.culture)
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(Slot::entry).map(ResourceNode::key)
    }

    /// Key, text and comment of every entry in document order.
    pub fn entries(&self) -> impl Iterator<Item = ResourceEntry<'_>> {
        self.nodes().map(|node| ResourceEntry {
            key: node.key(),
            text: node.text(),
            comment: node.comment(),
        })
    }

    /// The entry nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.slots.iter().filter_map(Slot::entry)
    }

    /// Number of string entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the document has no string entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True if `key` names a string entry of this document.
    pub fn key_exists(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// The node of `key`, if it exists.
    pub fn node(&self, key: &str) -> Option<&ResourceNode> {
        self.index
            .get(key)
            .and_then(|&position| self.slots.get(position))
            .and_then(Slot::entry)
    }

    /// Gets the text of `key`.
    ///
    /// # Returns
    ///
    /// `None` if the key does not exist, the (possibly empty) text otherwise.
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.node(key).map(ResourceNode::text)
    }

    /// Gets the comment of `key`; an entry without comment reads as `""`.
    pub fn get_comment(&self, key: &str) -> Option<&str> {
        self.node(key).map(ResourceNode::comment)
    }

    /// Sets the text of `key`, creating the entry if needed.
    ///
    /// Returns `Ok(false)` if the culture is not editable. Writing the current
    /// value again succeeds without touching the document.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<bool, Error> {
        if self.get_value(key) == Some(value) {
            return Ok(true);
        }
        self.set_node_data(key, |node| node.set_text(value))
    }

    /// Like [`ResourceLanguage::set_value`], but always writes, which
    /// materializes the entry even if the value is unchanged.
    pub fn force_value(&mut self, key: &str, value: &str) -> Result<bool, Error> {
        self.set_node_data(key, |node| node.set_text(value))
    }

    /// Sets the comment of `key`, creating the entry if needed. A blank
    /// comment removes the `<comment>` element.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the culture is not editable, `Ok(true)` otherwise.
    pub fn set_comment(&mut self, key: &str, comment: &str) -> Result<bool, Error> {
        if self.get_comment(key) == Some(comment) {
            return Ok(true);
        }
        self.set_node_data(key, |node| node.set_comment(comment))
    }

    fn set_node_data<F>(&mut self, key: &str, update: F) -> Result<bool, Error>
    where
        F: FnOnce(&mut ResourceNode),
    {
        if !self.can_edit() {
            return Ok(false);
        }

        if let Err(error) = self.apply_node_data(key, update) {
            return Err(self.report_failure(error));
        }

        self.mark_changed();
        Ok(true)
    }

    fn apply_node_data<F>(&mut self, key: &str, update: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ResourceNode),
    {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => self.create_node(key)?,
        };

        let Some(Slot::Entry(node)) = self.slots.get_mut(position) else {
            return Err(Error::InvalidResource(format!(
                "index of `{}` does not point at an entry",
                key
            )));
        };
        update(node);

        let emptied = node.text().is_empty() && node.comment().is_empty();
        if !self.neutral && emptied {
            self.slots.remove(position);
            self.reindex();
        }
        Ok(())
    }

    fn create_node(&mut self, key: &str) -> Result<usize, Error> {
        if key.is_empty() {
            return Err(Error::InvalidResource(
                "resource keys cannot be empty".to_string(),
            ));
        }

        let mut value = Element::new(&self.names.value);
        value.push(XmlNode::Text(String::new()));

        let mut element = Element::new(&self.names.data)
            .with_attribute(NAME_ATTRIBUTE, key)
            .with_attribute(SPACE_ATTRIBUTE, "preserve");
        element.push(XmlNode::Element(value));

        let position = self.slots.len();
        self.slots
            .push(Slot::Entry(ResourceNode::new(element, Arc::clone(&self.names))));
        self.index.insert(key.to_string(), position);
        Ok(position)
    }

    /// Renames `old_key` to `new_key`.
    ///
    /// Not applied if the culture is not editable, `old_key` does not exist,
    /// or `new_key` is empty or already taken.
    pub fn rename_key(&mut self, old_key: &str, new_key: &str) -> bool {
        if !self.can_edit() || new_key.is_empty() || self.index.contains_key(new_key) {
            return false;
        }
        let Some(position) = self.index.remove(old_key) else {
            return false;
        };
        if let Some(Slot::Entry(node)) = self.slots.get_mut(position) {
            node.set_key(new_key);
        }
        self.index.insert(new_key.to_string(), position);

        self.mark_changed();
        true
    }

    /// Removes `key` and its element. Not applied if the culture is not
    /// editable or the key does not exist.
    pub fn remove_key(&mut self, key: &str) -> bool {
        if !self.can_edit() {
            return false;
        }
        let Some(&position) = self.index.get(key) else {
            return false;
        };
        self.slots.remove(position);
        self.reindex();

        self.mark_changed();
        true
    }

    /// Moves the element of `key` right behind the element of the first key in
    /// `preceding` that exists in this document.
    ///
    /// Not applied if the culture is not editable, `key` does not exist, or
    /// none of the preceding keys exists.
    pub fn move_node<I, S>(&mut self, key: &str, preceding: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.can_edit() {
            return false;
        }
        let Some(&position) = self.index.get(key) else {
            return false;
        };
        let Some(anchor) = preceding
            .into_iter()
            .filter(|candidate| candidate.as_ref() != key)
            .find_map(|candidate| self.index.get(candidate.as_ref()).copied())
        else {
            return false;
        };

        let slot = self.slots.remove(position);
        let anchor = if anchor > position { anchor - 1 } else { anchor };
        self.slots.insert(anchor + 1, slot);
        self.reindex();

        self.mark_changed();
        true
    }

    /// Sorts the entries by key and saves.
    pub fn sort_nodes_by_key(&mut self) -> Result<(), Error> {
        self.save(true)
    }

    /// Writes the document back to its store.
    ///
    /// With `force_sort`, or when the configuration asks for it, all `<data>`
    /// elements are first moved behind the other content in key order. On
    /// failure the change flag is left set so the save can be retried.
    pub fn save(&mut self, force_sort: bool) -> Result<(), Error> {
        let configuration = Arc::clone(&self.context.configuration);
        if force_sort || configuration.sort_file_content_on_save {
            self.sort_nodes(configuration.resx_sorting_comparison);
        }

        let document = self.to_document();
        if let Err(error) = self.store.save(&document) {
            return Err(self.report_failure(error));
        }

        tracing::debug!(location = self.location(), "saved resource document");
        self.has_changes = false;
        Ok(())
    }

    fn sort_nodes(&mut self, comparison: SortComparison) {
        let names: &EntryNames = &self.names;
        let (mut data, rest): (Vec<Slot>, Vec<Slot>) = mem::take(&mut self.slots)
            .into_iter()
            .partition(|slot| slot.data_name(names).is_some());

        // Stable: equal keys keep their relative order.
        data.sort_by(|left, right| {
            let left = left.data_name(names).unwrap_or_default();
            let right = right.data_name(names).unwrap_or_default();
            comparison.compare(
                left.trim_start_matches('>'),
                right.trim_start_matches('>'),
            )
        });

        self.slots = rest;
        self.slots.extend(data);
        self.reindex();
    }

    /// The document as it would be saved.
    pub fn to_document(&self) -> XmlDocument {
        let mut root = self.document.root.clone();
        root.children = self.slots.iter().map(Slot::to_node).collect();
        XmlDocument {
            prolog: self.document.prolog.clone(),
            root,
            epilog: self.document.epilog.clone(),
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| slot.entry().map(|node| (node.key().to_string(), position)))
            .collect();
    }

    fn mark_changed(&mut self) {
        self.has_changes = true;
        self.context.events.emit(LanguageEvent::Changed {
            culture: self.culture.clone(),
        });
    }

    /// Notifies the user side channel and wraps `error` for the caller.
    fn report_failure(&self, error: Error) -> Error {
        let location = self.location().to_string();
        let message = format!("failed to write `{}`: {}", location, error);
        tracing::error!(location = %location, culture = %self.culture, "{}", message);
        self.context.events.emit(LanguageEvent::Failed {
            culture: self.culture.clone(),
            location: location.clone(),
            message,
        });
        if matches!(error, Error::Persistence { .. }) {
            error
        } else {
            Error::persistence(location, error)
        }
    }
}

impl PartialEq for ResourceLanguage {
    fn eq(&self, other: &Self) -> bool {
        self.culture == other.culture
    }
}

impl Eq for ResourceLanguage {}

impl Hash for ResourceLanguage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.culture.hash(state);
    }
}

impl Display for ResourceLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl Debug for ResourceLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLanguage")
            .field("culture", &self.culture)
            .field("location", &self.location())
            .field("entries", &self.index.len())
            .field("neutral", &self.neutral)
            .field("has_changes", &self.has_changes)
            .finish()
    }
}

/// Entries without a type or mimetype count as strings.
fn is_string_type(element: &Element) -> bool {
    match element.attribute(TYPE_ATTRIBUTE) {
        Some(declared) => {
            declared.is_empty()
                || starts_with_ignore_case(declared, "System.String")
                || starts_with_ignore_case(declared, "String")
        }
        None => element.attribute(MIMETYPE_ATTRIBUTE).is_none(),
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_uppercase)
        .eq(right.chars().flat_map(char::to_uppercase))
}

/// Renames every repeated key after its first occurrence to
/// `<key>_Duplicate[n]`, skipping suffixes already taken (ignoring case).
fn make_keys_unique(slots: &mut [Slot], location: &str) {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut group_of: HashMap<String, usize> = HashMap::new();
    for (position, slot) in slots.iter().enumerate() {
        if let Some(node) = slot.entry() {
            let key = node.key().to_string();
            match group_of.get(&key) {
                Some(&group) => groups[group].1.push(position),
                None => {
                    group_of.insert(key.clone(), groups.len());
                    groups.push((key, vec![position]));
                }
            }
        }
    }

    for (key, positions) in groups.iter().filter(|(_, positions)| positions.len() > 1) {
        let mut counter = 1;
        for &position in &positions[1..] {
            let new_key = loop {
                let candidate = format!("{}_Duplicate[{}]", key, counter);
                counter += 1;
                let taken = slots
                    .iter()
                    .filter_map(Slot::entry)
                    .any(|node| eq_ignore_case(node.key(), &candidate));
                if !taken {
                    break candidate;
                }
            };

            tracing::info!(location, key = %key, renamed = %new_key, "renamed duplicate key");
            if let Slot::Entry(node) = &mut slots[position] {
                node.set_key(&new_key);
            }
        }
    }
}

/// Maps keys to slot positions, or lists the duplicated keys.
fn build_index(slots: &[Slot]) -> Result<HashMap<String, usize>, String> {
    let mut index = HashMap::new();
    let mut duplicates: Vec<&str> = Vec::new();

    for (position, slot) in slots.iter().enumerate() {
        if let Some(node) = slot.entry() {
            if index.insert(node.key().to_string(), position).is_some()
                && !duplicates.contains(&node.key())
            {
                duplicates.push(node.key());
            }
        }
    }

    if duplicates.is_empty() {
        Ok(index)
    } else {
        Err(duplicates
            .iter()
            .map(|key| format!("\"{}\"", key))
            .collect::<Vec<_>>()
            .join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use indoc::indoc;
    use std::sync::mpsc::channel;

    const SAMPLE: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <root>
          <resheader name="resmimetype">
            <value>text/microsoft-resx</value>
          </resheader>
          <data name="Greeting" xml:space="preserve">
            <value>Hello</value>
            <comment>Shown on start</comment>
          </data>
          <data name="Farewell" xml:space="preserve">
            <value>Goodbye</value>
          </data>
          <data name="Icon" type="System.Drawing.Bitmap, System.Drawing" mimetype="application/x-microsoft.net.object.bytearray.base64">
            <value>AAAA</value>
          </data>
          <data name="&gt;&gt;button1.Name" xml:space="preserve">
            <value>button1</value>
          </data>
          <data name="Typed" type="System.String, mscorlib">
            <value>typed</value>
          </data>
        </root>
    "#};

    fn load(content: &str, neutral: bool) -> ResourceLanguage {
        ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Resources.resx", content),
            neutral,
            LanguageContext::default(),
        )
        .unwrap()
    }

    fn load_culture(content: &str, tag: &str, context: LanguageContext) -> ResourceLanguage {
        ResourceLanguage::load(
            CultureKey::parse(tag).unwrap(),
            MemoryStore::new(format!("Resources.{}.resx", tag), content),
            false,
            context,
        )
        .unwrap()
    }

    #[test]
    fn test_load_filters_non_string_entries() {
        let language = load(SAMPLE, true);
        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["Greeting", "Farewell", "Typed"]);
        assert_eq!(language.get_value("Greeting"), Some("Hello"));
        assert_eq!(language.get_comment("Greeting"), Some("Shown on start"));
        assert_eq!(language.get_comment("Farewell"), Some(""));
        assert_eq!(language.get_value("Icon"), None);
        assert_eq!(language.get_value(">>button1.Name"), None);
    }

    #[test]
    fn test_string_classification_edges() {
        let xml = indoc! {r#"
            <root>
              <data name="A" mimetype="application/x-microsoft.net.object.binary.base64">
                <value>AAEAAAD/////</value>
              </data>
              <data name="B" type="System.Int32, mscorlib">
                <value>42</value>
              </data>
              <data name="C" type="">
                <value>untyped</value>
              </data>
              <data name="D" type="system.string">
                <value>lowercase type</value>
              </data>
            </root>
        "#};
        let language = load(xml, true);
        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["C", "D"]);
        assert_eq!(language.get_value("C"), Some("untyped"));
    }

    #[test]
    fn test_node_access() {
        let mut language = load(SAMPLE, true);
        let node = language.node("Greeting").unwrap();
        assert_eq!(node.key(), "Greeting");
        assert_eq!(node.text(), "Hello");
        assert_eq!(node.comment(), "Shown on start");
        assert!(language.node("Icon").is_none());

        language.set_value("Farewell", "Bye").unwrap();
        let texts: Vec<&str> = language.nodes().map(ResourceNode::text).collect();
        assert_eq!(texts, vec!["Hello", "Bye", "typed"]);
    }

    #[test]
    fn test_crlf_values_read_with_line_feeds() {
        let xml = "<root>\r\n  <data name=\"Lines\" xml:space=\"preserve\">\r\n    <value>first\r\nsecond</value>\r\n  </data>\r\n</root>\r\n";
        let mut language = load(xml, true);
        assert_eq!(language.get_value("Lines"), Some("first\nsecond"));
        assert!(language.set_value("Lines", "first\nsecond").unwrap());
        assert!(!language.has_changes());
    }

    #[test]
    fn test_missing_key_reads_none() {
        let language = load(SAMPLE, true);
        assert_eq!(language.get_value("Nope"), None);
        assert_eq!(language.get_comment("Nope"), None);
        assert!(!language.key_exists("Nope"));
    }

    #[test]
    fn test_entry_without_value_reads_empty() {
        let language = load(r#"<root><data name="Bare"/></root>"#, true);
        assert_eq!(language.get_value("Bare"), Some(""));
    }

    #[test]
    fn test_default_namespace_is_respected() {
        let xml = r#"<root xmlns="urn:res"><data name="A"><value>a</value></data><data xmlns="" name="B"><value>b</value></data></root>"#;
        let language = load(xml, true);
        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["A"]);
    }

    #[test]
    fn test_missing_name_attribute_is_load_error() {
        let result = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Broken.resx", "<root><data><value>x</value></data></root>"),
            true,
            LanguageContext::default(),
        );
        assert!(matches!(result, Err(Error::MissingAttribute { .. })));
    }

    #[test]
    fn test_duplicate_keys_fail() {
        let xml = r#"<root><data name="A"><value>1</value></data><data name="A"><value>2</value></data></root>"#;
        let result = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Dup.resx", xml),
            true,
            LanguageContext::default(),
        );
        match result {
            Err(Error::DuplicateKeys { path, keys }) => {
                assert_eq!(path, "Dup.resx");
                assert_eq!(keys, "\"A\"");
            }
            other => panic!("expected duplicate key error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keys_renamed() {
        let xml = indoc! {r#"
            <root>
              <data name="Greeting"><value>1</value></data>
              <data name="Greeting"><value>2</value></data>
              <data name="greeting_duplicate[1]"><value>taken</value></data>
              <data name="Greeting"><value>3</value></data>
            </root>
        "#};
        let context = LanguageContext::new(
            Configuration::new().with_duplicate_key_handling(DuplicateKeyHandling::Rename),
        );
        let language = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Dup.resx", xml),
            true,
            context,
        )
        .unwrap();

        assert_eq!(language.get_value("Greeting"), Some("1"));
        assert_eq!(language.get_value("Greeting_Duplicate[2]"), Some("2"));
        assert_eq!(language.get_value("Greeting_Duplicate[3]"), Some("3"));
        assert_eq!(language.len(), 4);
    }

    #[test]
    fn test_set_value_creates_and_updates() {
        let mut language = load(SAMPLE, true);
        assert!(language.set_value("New", "Fresh").unwrap());
        assert_eq!(language.get_value("New"), Some("Fresh"));
        assert!(language.has_changes());

        assert!(language.set_value("Greeting", "Hi").unwrap());
        assert_eq!(language.get_value("Greeting"), Some("Hi"));

        let document = language.to_document();
        let written = document.to_xml_string().unwrap();
        assert!(written.contains(r#"<data name="New" xml:space="preserve">"#));
        assert!(written.contains("<value>Hi</value>"));
    }

    #[test]
    fn test_set_same_value_is_trivial_success() {
        let mut language = load(SAMPLE, true);
        assert!(language.set_value("Greeting", "Hello").unwrap());
        assert!(!language.has_changes());
    }

    #[test]
    fn test_force_value_marks_changed() {
        let (sender, receiver) = channel();
        let mut language = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Resources.resx", SAMPLE),
            true,
            LanguageContext::default().with_events(sender),
        )
        .unwrap();

        assert!(language.force_value("Greeting", "Hello").unwrap());
        assert!(language.has_changes());
        assert_eq!(
            receiver.try_recv().unwrap(),
            LanguageEvent::Changed {
                culture: CultureKey::neutral()
            }
        );
    }

    #[test]
    fn test_not_editable_is_not_applied() {
        let context = LanguageContext::default().with_edit_policy(|_: &CultureKey| false);
        let mut language = load_culture(SAMPLE, "de", context);

        assert!(!language.set_value("Greeting", "Hallo").unwrap());
        assert_eq!(language.get_value("Greeting"), Some("Hello"));
        assert!(!language.set_comment("Greeting", "x").unwrap());
        assert!(!language.rename_key("Greeting", "Hi"));
        assert!(!language.remove_key("Greeting"));
        assert!(!language.move_node("Greeting", ["Farewell"]));
        assert!(!language.has_changes());
    }

    #[test]
    fn test_emptied_entry_is_removed_from_specific_culture() {
        let mut language = load_culture(SAMPLE, "de", LanguageContext::default());
        assert!(language.set_comment("Greeting", "").unwrap());
        assert!(language.key_exists("Greeting"));
        assert!(language.set_value("Greeting", "").unwrap());
        assert!(!language.key_exists("Greeting"));
        assert!(!language.to_document().to_xml_string().unwrap().contains("Greeting"));
    }

    #[test]
    fn test_emptied_entry_stays_in_neutral_culture() {
        let mut language = load(SAMPLE, true);
        assert!(language.set_comment("Greeting", "").unwrap());
        assert!(language.set_value("Greeting", "").unwrap());
        assert!(language.key_exists("Greeting"));
        assert_eq!(language.get_value("Greeting"), Some(""));
    }

    #[test]
    fn test_setting_empty_value_on_missing_key_leaves_nothing_behind() {
        let mut language = load_culture(SAMPLE, "de", LanguageContext::default());
        assert!(language.set_value("Ghost", "").unwrap());
        assert!(!language.key_exists("Ghost"));
    }

    #[test]
    fn test_blank_comment_removes_comment_element() {
        let mut language = load(SAMPLE, true);
        assert!(language.set_comment("Greeting", "   ").unwrap());
        assert_eq!(language.get_comment("Greeting"), Some(""));
        let written = language.to_document().to_xml_string().unwrap();
        assert!(!written.contains("<comment>"));

        assert!(language.set_comment("Farewell", "Said on exit").unwrap());
        let written = language.to_document().to_xml_string().unwrap();
        assert!(written.contains("<comment>Said on exit</comment>"));
    }

    #[test]
    fn test_empty_key_is_persistence_error() {
        let (sender, receiver) = channel();
        let mut language = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Resources.resx", SAMPLE),
            true,
            LanguageContext::default().with_events(sender),
        )
        .unwrap();

        let error = language.set_value("", "x").unwrap_err();
        assert!(matches!(error, Error::Persistence { .. }));
        assert!(matches!(receiver.try_recv().unwrap(), LanguageEvent::Failed { .. }));
        assert!(!language.has_changes());
    }

    #[test]
    fn test_rename_key() {
        let mut language = load(SAMPLE, true);
        assert!(!language.rename_key("Greeting", "Farewell"));
        assert!(!language.rename_key("Missing", "Other"));
        assert!(!language.rename_key("Greeting", ""));

        assert!(language.rename_key("Greeting", "Welcome"));
        assert!(!language.key_exists("Greeting"));
        assert_eq!(language.get_value("Welcome"), Some("Hello"));
        assert_eq!(language.get_comment("Welcome"), Some("Shown on start"));
        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["Welcome", "Farewell", "Typed"]);
    }

    #[test]
    fn test_remove_key() {
        let mut language = load(SAMPLE, true);
        assert!(!language.remove_key("Missing"));
        assert!(language.remove_key("Greeting"));
        assert!(!language.key_exists("Greeting"));
        assert_eq!(language.get_value("Farewell"), Some("Goodbye"));
        assert_eq!(language.len(), 2);
    }

    #[test]
    fn test_move_node() {
        let mut language = load(SAMPLE, true);
        assert!(language.move_node("Greeting", ["Missing", "Typed", "Farewell"]));
        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["Farewell", "Typed", "Greeting"]);

        assert!(language.move_node("Typed", ["Greeting"]));
        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["Farewell", "Greeting", "Typed"]);

        assert!(!language.move_node("Typed", ["Missing"]));
        assert!(!language.move_node("Missing", ["Typed"]));
        assert!(!language.move_node("Typed", ["Typed"]));
    }

    #[test]
    fn test_save_sorts_data_behind_headers() {
        let store = MemoryStore::new("Resources.resx", SAMPLE);
        let mut language = ResourceLanguage::load(
            CultureKey::neutral(),
            store.clone(),
            true,
            LanguageContext::default(),
        )
        .unwrap();
        language.set_value("Apple", "a").unwrap();
        language.sort_nodes_by_key().unwrap();
        assert!(!language.has_changes());

        let keys: Vec<&str> = language.keys().collect();
        assert_eq!(keys, vec!["Apple", "Farewell", "Greeting", "Typed"]);

        let saved = store.contents().unwrap();
        let header = saved.find("resheader").unwrap();
        let apple = saved.find("\"Apple\"").unwrap();
        let farewell = saved.find("\"Farewell\"").unwrap();
        let icon = saved.find("\"Icon\"").unwrap();
        let typed = saved.find("\"Typed\"").unwrap();
        let button = saved.find("button1.Name").unwrap();
        assert!(header < apple);
        assert!(apple < farewell);
        assert!(farewell < icon);
        assert!(icon < typed);
        assert!(typed < button);
    }

    #[test]
    fn test_save_without_sort_keeps_order() {
        let store = MemoryStore::new("Resources.resx", SAMPLE);
        let mut language = ResourceLanguage::load(
            CultureKey::neutral(),
            store.clone(),
            true,
            LanguageContext::default(),
        )
        .unwrap();
        language.set_value("Apple", "a").unwrap();
        language.save(false).unwrap();

        let reloaded = load(&store.contents().unwrap(), true);
        let keys: Vec<&str> = reloaded.keys().collect();
        assert_eq!(keys, vec!["Greeting", "Farewell", "Typed", "Apple"]);
    }

    #[test]
    fn test_equality_by_culture() {
        let a = load(SAMPLE, true);
        let b = load(r#"<root/>"#, false);
        assert_eq!(a, b);
        assert_eq!(a.display_name(), "Neutral");
        let c = load_culture(SAMPLE, "fr", LanguageContext::default());
        assert_ne!(a, c);
        assert_eq!(c.to_string(), "fr");
    }
}
