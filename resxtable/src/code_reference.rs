//! Rules describing how source files are scanned for references to resource keys.
//!
//! A rule pairs a set of file extensions with a match pattern. Patterns use the
//! placeholders `$File` (the resource file's base name) and `$Key` (the resource
//! key); expanding and executing them is up to the scanner. Rule order matters:
//! scanners apply the first rule that matches a file.

use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

/// One scan rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleItem {
    /// Comma-separated extensions, e.g. `.cs,.xaml`.
    #[serde(rename = "Extensions", default)]
    extensions: String,
    #[serde(rename = "IsCaseSensitive", default)]
    case_sensitive: bool,
    #[serde(rename = "Expression", default)]
    pattern: String,
    /// Marker that starts a single-line comment in the scanned language.
    #[serde(rename = "SingleLineComment", default)]
    line_comment: Option<String>,
}

/// A property of a [`RuleItem`], as reported in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleProperty {
    Extensions,
    CaseSensitive,
    Pattern,
    LineComment,
}

impl RuleItem {
    /// Creates a rule.
    ///
    /// # Parameters
    ///
    /// - `extensions`: comma-separated file extensions, e.g. `.cs,.vb`
    /// - `case_sensitive`: whether `pattern` matches case-sensitively
    /// - `pattern`: the reference pattern; `$File` and `$Key` are placeholders
    /// - `line_comment`: the single-line comment token of the language, if any
    pub fn new(
        extensions: &str,
        case_sensitive: bool,
        pattern: &str,
        line_comment: Option<&str>,
    ) -> Self {
        Self {
            extensions: extensions.to_string(),
            case_sensitive,
            pattern: pattern.to_string(),
            line_comment: line_comment.map(str::to_string),
        }
    }

    /// The raw comma-separated extension list.
    pub fn extensions(&self) -> &str {
        &self.extensions
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The reference pattern as entered.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Lines starting with this token are skipped when scanning.
    pub fn line_comment(&self) -> Option<&str> {
        self.line_comment.as_deref()
    }

    /// The extension list split on commas, trimmed, blanks removed.
    pub fn parsed_extensions(&self) -> Vec<&str> {
        self.extensions
            .split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Whether this rule covers files with the given extension (with or
    /// without the leading dot, compared case-insensitively).
    pub fn applies_to(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.parsed_extensions()
            .iter()
            .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    // Setters return whether the value changed; unchanged writes are silent.

    pub fn set_extensions(&mut self, value: impl Into<String>) -> bool {
        set_if_changed(&mut self.extensions, value.into())
    }

    pub fn set_case_sensitive(&mut self, value: bool) -> bool {
        set_if_changed(&mut self.case_sensitive, value)
    }

    pub fn set_pattern(&mut self, value: impl Into<String>) -> bool {
        set_if_changed(&mut self.pattern, value.into())
    }

    pub fn set_line_comment(&mut self, value: Option<String>) -> bool {
        set_if_changed(&mut self.line_comment, value)
    }
}

fn set_if_changed<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}

/// Notification that a property of the item at `index` changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPropertyChanged {
    pub index: usize,
    pub property: RuleProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ItemPropertyChanged) + Send + Sync>;

/// Ordered list of scan rules with a single subscription point for changes to
/// any item.
#[derive(Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(rename = "Items", default)]
    items: Vec<RuleItem>,
    #[serde(skip)]
    listeners: Vec<(SubscriptionId, Listener)>,
    #[serde(skip)]
    next_subscription: u64,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules, in the order scanners must apply them.
    pub fn default_rules() -> Self {
        let mut rules = Self::new();
        rules.push(RuleItem::new(
            ".cs,.xaml,.cshtml",
            true,
            r"\W($File.$Key)\W",
            Some("//"),
        ));
        rules.push(RuleItem::new(
            ".cs",
            true,
            r#"ResourceManager.GetString\("($Key)"\)"#,
            Some("//"),
        ));
        rules.push(RuleItem::new(
            ".cs",
            true,
            r#"typeof\((\w+\.)*($File)\).+"($Key)"|"($Key)".+typeof\((\w+\.)*($File)\)"#,
            Some("//"),
        ));
        rules.push(RuleItem::new(".vb", false, r"\W($Key)\W", Some("'")));
        rules.push(RuleItem::new(
            ".cpp,.c,.hxx,.h",
            true,
            r"\W($File::$Key)\W",
            Some("//"),
        ));
        rules.push(RuleItem::new(
            ".aspx,.ascx",
            true,
            r"<%\$\s+Resources:\s*($File)\s*,\s*($Key)\s*%>",
            None,
        ));
        rules.push(RuleItem::new(
            ".cs",
            true,
            r"StringResourceKey\.($Key)",
            Some("//"),
        ));
        rules
    }

    /// The rules in scan order.
    pub fn items(&self) -> &[RuleItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RuleItem> {
        self.items.get(index)
    }

    pub fn push(&mut self, item: RuleItem) {
        self.items.push(item);
    }

    /// Removes the rule at `index`, `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<RuleItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Rules covering the given extension, in list order.
    pub fn rules_for<'a>(&'a self, extension: &'a str) -> impl Iterator<Item = &'a RuleItem> {
        self.items.iter().filter(move |item| item.applies_to(extension))
    }

    /// Edits the item at `index`; changes are forwarded to subscribers.
    pub fn edit(&mut self, index: usize) -> Option<RuleEditor<'_>> {
        (index < self.items.len()).then_some(RuleEditor { set: self, index })
    }

    /// Registers a listener for property changes of any item.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ItemPropertyChanged) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, index: usize, property: RuleProperty) {
        let change = ItemPropertyChanged { index, property };
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

impl Clone for RuleSet {
    /// Clones the rules; subscriptions stay with the original.
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for RuleSet {}

impl Debug for RuleSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RuleItem;
    type IntoIter = std::slice::Iter<'a, RuleItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Mutable access to one item of a [`RuleSet`].
pub struct RuleEditor<'a> {
    set: &'a mut RuleSet,
    index: usize,
}

impl RuleEditor<'_> {
    pub fn item(&self) -> &RuleItem {
        &self.set.items[self.index]
    }

    pub fn set_extensions(&mut self, value: impl Into<String>) -> bool {
        let changed = self.set.items[self.index].set_extensions(value);
        self.forward(changed, RuleProperty::Extensions)
    }

    pub fn set_case_sensitive(&mut self, value: bool) -> bool {
        let changed = self.set.items[self.index].set_case_sensitive(value);
        self.forward(changed, RuleProperty::CaseSensitive)
    }

    pub fn set_pattern(&mut self, value: impl Into<String>) -> bool {
        let changed = self.set.items[self.index].set_pattern(value);
        self.forward(changed, RuleProperty::Pattern)
    }

    pub fn set_line_comment(&mut self, value: Option<String>) -> bool {
        let changed = self.set.items[self.index].set_line_comment(value);
        self.forward(changed, RuleProperty::LineComment)
    }

    fn forward(&mut self, changed: bool, property: RuleProperty) -> bool {
        if changed {
            self.set.notify(self.index, property);
        }
        changed
    }
}
