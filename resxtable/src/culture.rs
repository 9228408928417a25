//! Culture identity of a resource document.

use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

use lazy_static::lazy_static;
use regex::Regex;
use unic_langid::LanguageIdentifier;

use crate::error::Error;

lazy_static! {
    // Base.fr-CA.resx → ("Base", "fr-CA"); Base.resx → ("Base", none)
    static ref RESX_FILE_NAME: Regex =
        Regex::new(r"(?i)^(?P<base>.+?)(?:\.(?P<culture>[a-z]{2,3}(?:-[a-z0-9]{2,8})*))?\.resx$")
            .unwrap();

    // ISO 639-1 codes, plus the three-letter languages .NET ships cultures for.
    static ref KNOWN_LANGUAGES: HashSet<&'static str> = [
        "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
        "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv",
        "cy", "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi",
        "fj", "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
        "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja",
        "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw",
        "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml",
        "mn", "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv",
        "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu", "rm", "rn", "ro",
        "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sn", "so", "sq", "sr",
        "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr",
        "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi",
        "yo", "za", "zh", "zu",
        "arn", "ast", "bas", "bem", "byn", "ceb", "chr", "ckb", "dsb", "dua", "fil", "fur", "gsw",
        "haw", "hsb", "kab", "kok", "ksh", "lkt", "moh", "nds", "nqo", "nso", "prs", "quc", "quz",
        "sah", "sma", "smj", "smn", "sms", "syr", "tzm", "yue", "zgh",
    ]
    .into_iter()
    .collect();
}

/// True if the language subtag of `tag` is a known language code.
fn is_known_language(tag: &str) -> bool {
    tag.split('-')
        .next()
        .is_some_and(|language| KNOWN_LANGUAGES.contains(language.to_ascii_lowercase().as_str()))
}

/// Identifies the culture of one resource document. `None` is the neutral
/// (culture-less) document.
///
/// Equality, hashing and ordering only look at the language identifier; the
/// neutral culture sorts first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CultureKey(Option<LanguageIdentifier>);

impl CultureKey {
    pub fn neutral() -> Self {
        Self(None)
    }

    pub fn new(language: LanguageIdentifier) -> Self {
        Self(Some(language))
    }

    /// Parses a BCP 47 tag; an empty string is the neutral culture.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(Self::neutral());
        }
        tag.parse::<LanguageIdentifier>()
            .map(Self::new)
            .map_err(|_| Error::InvalidCulture(tag.to_string()))
    }

    pub fn language(&self) -> Option<&LanguageIdentifier> {
        self.0.as_ref()
    }

    pub fn is_neutral(&self) -> bool {
        self.0.is_none()
    }

    /// The tag used in file names (`fr-CA`), empty for the neutral culture.
    pub fn tag(&self) -> String {
        self.0.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

impl Display for CultureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(language) => write!(f, "{}", language),
            None => write!(f, "neutral"),
        }
    }
}

impl FromStr for CultureKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialOrd for CultureKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CultureKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => left.to_string().cmp(&right.to_string()),
        }
    }
}

/// The parts of a resource file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFileName {
    pub base_name: String,
    pub culture: CultureKey,
}

impl ResourceFileName {
    /// Splits `Base.fr-CA.resx` into `Base` and `fr-CA`.
    ///
    /// A middle segment that is not a known language stays part of the base
    /// name, so `Form1.Designer.resx` is the neutral file of `Form1.Designer`
    /// and `Errors.Ui.resx` the neutral file of `Errors.Ui`.
    pub fn parse<P: AsRef<Path>>(path: P) -> Option<Self> {
        let file_name = path.as_ref().file_name()?.to_str()?;
        let captures = RESX_FILE_NAME.captures(file_name)?;
        let base_name = captures.name("base")?.as_str();

        match captures.name("culture") {
            Some(culture) => match CultureKey::parse(culture.as_str())
                .ok()
                .filter(|_| is_known_language(culture.as_str()))
            {
                Some(key) => Some(Self {
                    base_name: base_name.to_string(),
                    culture: key,
                }),
                None => Some(Self {
                    base_name: format!("{}.{}", base_name, culture.as_str()),
                    culture: CultureKey::neutral(),
                }),
            },
            None => Some(Self {
                base_name: base_name.to_string(),
                culture: CultureKey::neutral(),
            }),
        }
    }

    /// The file name for the given culture of this base name.
    pub fn file_name_for(base_name: &str, culture: &CultureKey) -> String {
        if culture.is_neutral() {
            format!("{}.resx", base_name)
        } else {
            format!("{}.{}.resx", base_name, culture.tag())
        }
    }
}
