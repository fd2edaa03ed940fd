use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "fileselect";

pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// `<config_dir>/fileselect/<file_name>`, falling back to the working directory.
pub fn app_config_path(file_name: &str) -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME).join(file_name)
}

/// Resolve a path from an environment variable, ignoring blank values.
pub fn path_from_env(var: &str) -> Option<PathBuf> {
    let raw = std::env::var(var).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| expand_tilde(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        let Some(home) = home_dir() else { return };
        assert_eq!(expand_tilde("~/a/b.json"), home.join("a/b.json"));
        assert_eq!(expand_tilde("  /tmp/x.json "), PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn blank_env_path_is_ignored() {
        temp_env::with_var("FILESELECT_TEST_PATH", Some("   "), || {
            assert!(path_from_env("FILESELECT_TEST_PATH").is_none());
        });
        temp_env::with_var("FILESELECT_TEST_PATH", Some("/tmp/state.json"), || {
            assert_eq!(path_from_env("FILESELECT_TEST_PATH"), Some(PathBuf::from("/tmp/state.json")));
        });
    }
}
