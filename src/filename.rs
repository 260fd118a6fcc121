//! File names for exported documents

use regex::Regex;

/// Turn a document number such as `FS 12/03/2024` into a usable file stem
pub fn safe_filename(text: &str) -> String {
    let invalid_chars = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
    let result: String = text
        .chars()
        .map(|c| if invalid_chars.contains(&c) || c.is_control() { '_' } else { c })
        .collect();

    let mut result = result.trim().to_string();
    if let Ok(re) = Regex::new(r"\s+") {
        result = re.replace_all(&result, "_").into_owned();
    }
    if let Ok(re) = Regex::new(r"_+") {
        result = re.replace_all(&result, "_").into_owned();
    }

    // Windows rejects names ending with a dot
    let result = result.trim_matches('_').trim_end_matches('.');

    if result.is_empty() {
        "dokument".to_string()
    } else {
        result.to_string()
    }
}
