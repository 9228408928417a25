use resxtable::{CultureKey, ResourceFileName};
use std::path::Path;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("File does not exist: {}", path));
    }

    if !path_obj.is_file() {
        return Err(format!("Path is not a file: {}", path));
    }

    Ok(())
}

/// Validate the path names a resource file and return its culture
pub fn validate_resource_path(path: &str) -> Result<CultureKey, String> {
    validate_file_path(path)?;

    ResourceFileName::parse(path)
        .map(|name| name.culture)
        .ok_or_else(|| format!("Not a resource file (expected *.resx): {}", path))
}

/// Validate a key given on the command line
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("Key cannot be empty".to_string());
    }
    Ok(())
}
