use resxtable::Configuration;

use crate::edit::open_language;

const TRUNCATE_AT: usize = 50;

fn truncate(value: &str, full: bool) -> String {
    if full || value.chars().count() <= TRUNCATE_AT {
        value.to_string()
    } else {
        let head: String = value.chars().take(TRUNCATE_AT).collect();
        format!("{}...", head)
    }
}

/// Print the string entries of a resource file.
pub fn run_view_command(input: &str, config: Configuration, full: bool) -> Result<(), String> {
    let language = open_language(input, config, false)?;

    println!("=== {} ===", input);
    println!("Language: {}", language.display_name());
    println!("Entries: {}", language.len());

    for (i, entry) in language.entries().enumerate() {
        println!("\n  Entry {}: {}", i + 1, entry.key);
        println!("    Value: {}", truncate(entry.text, full));
        if !entry.comment.is_empty() {
            println!("    Comment: {}", truncate(entry.comment, full));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_on_char_boundary() {
        let long = "ä".repeat(60);
        let shown = truncate(&long, false);
        assert_eq!(shown.chars().count(), TRUNCATE_AT + 3);
        assert!(shown.ends_with("..."));
        assert_eq!(truncate(&long, true), long);
        assert_eq!(truncate("short", false), "short");
    }
}
