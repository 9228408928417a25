use proptest::prelude::*;
use resxtable::traits::Parser;
use resxtable::{
    Configuration, CultureKey, DuplicateKeyHandling, FileStore, LanguageContext, MemoryStore,
    ResourceLanguage, SortComparison, TranslationItem, TranslationMatch, TranslatorInfo,
    XmlDocument,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9_.]{0,15}").expect("valid key regex")
}

fn value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 <>&\"'_\\-\\.,!\\?]{0,30}").expect("valid value regex")
}

fn comment_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("([A-Za-z<>&][A-Za-z0-9 <>&\\.]{0,20})?")
        .expect("valid comment regex")
}

fn dataset_strategy() -> impl Strategy<Value = BTreeMap<String, (String, String)>> {
    prop::collection::btree_map(key_strategy(), (value_strategy(), comment_strategy()), 1..10)
}

fn create_empty_resx(path: &Path) -> Result<(), TestCaseError> {
    XmlDocument::empty_resx()
        .and_then(|document| document.write_to(path))
        .map_err(|e| TestCaseError::fail(e.to_string()))
}

fn load_neutral(path: &Path, configuration: Configuration) -> Result<ResourceLanguage, TestCaseError> {
    ResourceLanguage::load(
        CultureKey::neutral(),
        FileStore::new(path),
        true,
        LanguageContext::new(configuration),
    )
    .map_err(|e| TestCaseError::fail(e.to_string()))
}

fn fill(
    language: &mut ResourceLanguage,
    values: &BTreeMap<String, (String, String)>,
) -> Result<(), TestCaseError> {
    // Reverse order so that document order differs from key order.
    for (key, (value, comment)) in values.iter().rev() {
        language
            .force_value(key, value)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        language
            .set_comment(key, comment)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
    }
    Ok(())
}

fn canonical_map(language: &ResourceLanguage) -> BTreeMap<String, (String, String)> {
    language
        .entries()
        .map(|entry| {
            (
                entry.key.to_string(),
                (entry.text.to_string(), entry.comment.to_string()),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn save_reload_preserves_entries(values in dataset_strategy()) {
        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let path = tmp.path().join("Resources.resx");
        create_empty_resx(&path)?;

        let mut language = load_neutral(&path, Configuration::default())?;
        fill(&mut language, &values)?;
        prop_assert!(language.has_changes());
        language.save(false).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(!language.has_changes());

        let reloaded = load_neutral(&path, Configuration::default())?;
        prop_assert_eq!(canonical_map(&reloaded), values.clone());

        let expected_order: Vec<&str> = values.keys().rev().map(String::as_str).collect();
        let actual_order: Vec<&str> = reloaded.keys().collect();
        prop_assert_eq!(actual_order, expected_order);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn sort_on_save_orders_keys(values in dataset_strategy()) {
        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let path = tmp.path().join("Resources.resx");
        create_empty_resx(&path)?;

        let configuration = Configuration::new()
            .with_sort_on_save(true)
            .with_sort_comparison(SortComparison::Ordinal);
        let mut language = load_neutral(&path, configuration.clone())?;
        fill(&mut language, &values)?;
        language.save(false).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let reloaded = load_neutral(&path, configuration)?;
        let expected_order: Vec<&str> = values.keys().map(String::as_str).collect();
        let actual_order: Vec<&str> = reloaded.keys().collect();
        prop_assert_eq!(actual_order, expected_order);
        prop_assert_eq!(canonical_map(&reloaded), values.clone());
    }
}

fn duplicated_keys_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vec!["Alpha", "Beta", "Gamma"]), 1..12)
}

fn resx_with_keys(keys: &[&str]) -> String {
    let mut xml = String::from("<root>");
    for (i, key) in keys.iter().enumerate() {
        xml.push_str(&format!(
            r#"<data name="{}" xml:space="preserve"><value>{}</value></data>"#,
            key, i
        ));
    }
    xml.push_str("</root>");
    xml
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn renamed_duplicates_are_unique(keys in duplicated_keys_strategy()) {
        let context = LanguageContext::new(
            Configuration::new().with_duplicate_key_handling(DuplicateKeyHandling::Rename),
        );
        let language = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Dup.resx", resx_with_keys(&keys)),
            true,
            context,
        )
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let loaded: Vec<&str> = language.keys().collect();
        prop_assert_eq!(loaded.len(), keys.len());
        let unique: HashSet<&str> = loaded.iter().copied().collect();
        prop_assert_eq!(unique.len(), keys.len());

        let mut seen = HashSet::new();
        for (original, loaded) in keys.iter().zip(&loaded) {
            if seen.insert(*original) {
                prop_assert_eq!(*loaded, *original);
            } else {
                let prefix = format!("{}_Duplicate[", original);
                prop_assert!(loaded.starts_with(&prefix));
            }
        }

        let fail = ResourceLanguage::load(
            CultureKey::neutral(),
            MemoryStore::new("Dup.resx", resx_with_keys(&keys)),
            true,
            LanguageContext::default(),
        );
        prop_assert_eq!(fail.is_ok(), seen.len() == keys.len());
    }
}

fn candidates_strategy() -> impl Strategy<Value = Vec<(String, f64)>> {
    prop::collection::vec(
        (
            proptest::string::string_regex("[A-E]").expect("valid name regex"),
            (0u8..=10).prop_map(|step| f64::from(step) / 10.0),
        ),
        1..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn candidates_are_ordered_by_rating_then_name(candidates in candidates_strategy()) {
        let mut item = TranslationItem::new("Greeting", "Hello", CultureKey::neutral());
        for (i, (name, rating)) in candidates.iter().enumerate() {
            let translator = TranslatorInfo::new(name.to_lowercase(), name.clone());
            item.add_result(TranslationMatch::new(translator, format!("text {}", i), *rating));
        }

        let ordered = item.ordered_results();
        prop_assert_eq!(ordered.len(), candidates.len());
        for pair in ordered.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(
                a.rating() > b.rating()
                    || (a.rating() == b.rating()
                        && a.translator().display_name <= b.translator().display_name)
            );
        }
        prop_assert_eq!(item.translation(), Some(ordered[0].translated_text()));
    }
}
