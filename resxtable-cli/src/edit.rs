use resxtable::{
    Configuration, DuplicateKeyHandling, FileStore, LanguageContext, ResourceLanguage,
    SortComparison,
};

use crate::validation::{validate_key, validate_resource_path};

/// Load one resource file. The neutral culture is the file without a culture
/// suffix unless `neutral` forces it.
pub fn open_language(
    input: &str,
    config: Configuration,
    neutral: bool,
) -> Result<ResourceLanguage, String> {
    let culture = validate_resource_path(input)?;
    let neutral = neutral || culture.is_neutral();
    tracing::debug!(input, culture = %culture, neutral, "opening resource file");

    ResourceLanguage::load(
        culture,
        FileStore::new(input),
        neutral,
        LanguageContext::new(config),
    )
    .map_err(|e| format!("Failed to read input: {}", e))
}

fn save(language: &mut ResourceLanguage, force_sort: bool) -> Result<(), String> {
    language
        .save(force_sort)
        .map_err(|e| format!("Error writing output: {}", e))
}

pub fn run_set_command(
    input: &str,
    config: Configuration,
    key: &str,
    value: Option<String>,
    comment: Option<String>,
    neutral: bool,
) -> Result<(), String> {
    validate_key(key)?;
    if value.is_none() && comment.is_none() {
        return Err("Nothing to set; pass --value and/or --comment".to_string());
    }

    let mut language = open_language(input, config, neutral)?;
    let existed = language.key_exists(key);

    if let Some(value) = &value {
        let applied = language.set_value(key, value).map_err(|e| e.to_string())?;
        if !applied {
            return Err(format!("'{}' cannot be edited", language.display_name()));
        }
    }
    if let Some(comment) = &comment {
        let applied = language
            .set_comment(key, comment)
            .map_err(|e| e.to_string())?;
        if !applied {
            return Err(format!("'{}' cannot be edited", language.display_name()));
        }
    }

    save(&mut language, false)?;

    if !language.key_exists(key) {
        println!("✅ Removed '{}' (empty value and comment)", key);
    } else if existed {
        println!("✅ Updated '{}' in {}", key, input);
    } else {
        println!("✅ Added '{}' to {}", key, input);
    }
    Ok(())
}

pub fn run_rename_command(
    input: &str,
    config: Configuration,
    from: &str,
    to: &str,
) -> Result<(), String> {
    validate_key(to)?;
    let mut language = open_language(input, config, false)?;

    if !language.rename_key(from, to) {
        return Err(if language.key_exists(to) {
            format!("Key '{}' already exists", to)
        } else {
            format!("Key '{}' not found in {}", from, input)
        });
    }

    save(&mut language, false)?;
    println!("✅ Renamed '{}' to '{}'", from, to);
    Ok(())
}

pub fn run_remove_command(input: &str, config: Configuration, key: &str) -> Result<(), String> {
    let mut language = open_language(input, config, false)?;

    if !language.remove_key(key) {
        return Err(format!("Key '{}' not found in {}", key, input));
    }

    save(&mut language, false)?;
    println!("✅ Removed '{}' from {}", key, input);
    Ok(())
}

pub fn run_sort_command(
    input: &str,
    config: Configuration,
    comparison: Option<String>,
) -> Result<(), String> {
    let config = match comparison {
        Some(name) => {
            let comparison = name.parse::<SortComparison>().map_err(|e| e.to_string())?;
            config.with_sort_comparison(comparison)
        }
        None => config,
    };
    let comparison = config.resx_sorting_comparison;

    let mut language = open_language(input, config, false)?;
    language
        .sort_nodes_by_key()
        .map_err(|e| format!("Error writing output: {}", e))?;

    println!(
        "✅ Sorted {} entries in {} ({})",
        language.len(),
        input,
        comparison
    );
    Ok(())
}

pub fn run_dedupe_command(input: &str, config: Configuration) -> Result<(), String> {
    let config = config.with_duplicate_key_handling(DuplicateKeyHandling::Rename);
    let mut language = open_language(input, config, false)?;

    save(&mut language, false)?;
    println!("✅ {} unique key(s) in {}", language.len(), input);
    Ok(())
}
