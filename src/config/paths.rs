use directories::ProjectDirs;
use std::path::PathBuf;

pub const SETTINGS_FILE: &str = "exim2sieve.json";

pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "exim2sieve").map(|d| d.config_dir().to_path_buf())
}

/// Settings locations tried when no explicit path is given, in order.
pub fn settings_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(SETTINGS_FILE)];
    if let Some(dir) = config_dir() {
        candidates.push(dir.join(SETTINGS_FILE));
    }
    candidates
}
