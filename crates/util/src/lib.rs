use once_cell::sync::Lazy;
use regex::Regex;

pub mod config;
pub mod path_processing;
pub mod selection_store;

pub use config::*;
pub use path_processing::*;
pub use selection_store::*;

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(bearer )([\w\-\.=:/+]+)",
        r"(?i)(authorization: )([\w\-\.=:/+]+)",
        r"(?i)([A-Z0-9_]*?(KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in SENSITIVE_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}

/// Trim and shorten `text` to at most `max_len` characters, ending in `...`
/// when cut.
pub fn truncate_for_summary(text: &str, max_len: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }

    let target_len = max_len.saturating_sub(3);
    let mut truncated: String = trimmed.chars().take(target_len).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_tokens_and_headers() {
        let line = "authorization: abc123 API_TOKEN=xyz Bearer s3cr3t";
        let redacted = redact_sensitive(line);
        assert!(!redacted.contains("abc123"));
        assert!(!redacted.contains("xyz"));
        assert!(!redacted.contains("s3cr3t"));
        assert!(redacted.contains("API_TOKEN=<redacted>"));
    }

    #[test]
    fn truncate_for_summary_trims_and_truncates() {
        assert_eq!(truncate_for_summary(" short message ", 20), "short message");
        assert_eq!(truncate_for_summary("abcdefghij", 5), "ab...");
    }
}
