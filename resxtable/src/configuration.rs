//! Settings that shape how resource documents are loaded and saved.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{code_reference::RuleSet, error::Error};

/// What to do when a document contains the same key more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicateKeyHandling {
    /// Refuse to load the document.
    #[default]
    Fail,
    /// Rename every repeated key to `<key>_Duplicate[n]`.
    Rename,
}

/// Key comparison used when sorting entries on save.
///
/// The culture-aware modes compare case-insensitively first and then order
/// lowercase before uppercase, so `apple < Apple < banana`. No locale-specific
/// tailoring is applied, which makes `Culture` and `InvariantCulture` behave
/// the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortComparison {
    #[default]
    Ordinal,
    OrdinalIgnoreCase,
    Culture,
    CultureIgnoreCase,
    InvariantCulture,
    InvariantCultureIgnoreCase,
}

impl SortComparison {
    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match self {
            SortComparison::Ordinal => left.cmp(right),
            SortComparison::OrdinalIgnoreCase => left
                .chars()
                .flat_map(char::to_uppercase)
                .cmp(right.chars().flat_map(char::to_uppercase)),
            SortComparison::Culture | SortComparison::InvariantCulture => {
                fold_case(left, right).then_with(|| lower_first(left, right))
            }
            SortComparison::CultureIgnoreCase | SortComparison::InvariantCultureIgnoreCase => {
                fold_case(left, right)
            }
        }
    }
}

fn fold_case(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}

fn lower_first(left: &str, right: &str) -> Ordering {
    for (l, r) in left.chars().zip(right.chars()) {
        if l != r {
            return match (l.is_lowercase(), r.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => l.cmp(&r),
            };
        }
    }
    left.chars().count().cmp(&right.chars().count())
}

impl Display for SortComparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortComparison::Ordinal => "ordinal",
            SortComparison::OrdinalIgnoreCase => "ordinalIgnoreCase",
            SortComparison::Culture => "culture",
            SortComparison::CultureIgnoreCase => "cultureIgnoreCase",
            SortComparison::InvariantCulture => "invariantCulture",
            SortComparison::InvariantCultureIgnoreCase => "invariantCultureIgnoreCase",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SortComparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', '_'], "").to_ascii_lowercase();
        match normalized.as_str() {
            "ordinal" => Ok(SortComparison::Ordinal),
            "ordinalignorecase" => Ok(SortComparison::OrdinalIgnoreCase),
            "culture" | "currentculture" => Ok(SortComparison::Culture),
            "cultureignorecase" | "currentcultureignorecase" => {
                Ok(SortComparison::CultureIgnoreCase)
            }
            "invariantculture" => Ok(SortComparison::InvariantCulture),
            "invariantcultureignorecase" => Ok(SortComparison::InvariantCultureIgnoreCase),
            other => Err(Error::InvalidResource(format!(
                "unknown sort comparison `{}`",
                other
            ))),
        }
    }
}

/// Configuration shared by every document of a resource table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub duplicate_key_handling: DuplicateKeyHandling,
    /// Sort entries by key every time a document is saved.
    pub sort_file_content_on_save: bool,
    pub resx_sorting_comparison: SortComparison,
    pub code_references: RuleSet,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            duplicate_key_handling: DuplicateKeyHandling::default(),
            sort_file_content_on_save: false,
            resx_sorting_comparison: SortComparison::default(),
            code_references: RuleSet::default_rules(),
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_key_handling(mut self, handling: DuplicateKeyHandling) -> Self {
        self.duplicate_key_handling = handling;
        self
    }

    pub fn with_sort_on_save(mut self, sort: bool) -> Self {
        self.sort_file_content_on_save = sort;
        self
    }

    pub fn with_sort_comparison(mut self, comparison: SortComparison) -> Self {
        self.resx_sorting_comparison = comparison;
        self
    }

    pub fn with_code_references(mut self, rules: RuleSet) -> Self {
        self.code_references = rules;
        self
    }

    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
