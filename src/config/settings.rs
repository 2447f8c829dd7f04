use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::paths;
use crate::error::{Error, Result};

/// Conversion settings, read from `exim2sieve.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub output_dir: PathBuf,
    /// File extension of written scripts, without the dot.
    pub extension: String,
    /// Write one combined script per input instead of one per filter entry.
    pub combine: bool,
    /// Name of the combined script; defaults to one derived from the input.
    pub combined_name: Option<String>,
    /// Run the offline checker over every generated script.
    pub verify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("sieve"),
            extension: "sieve".to_string(),
            combine: true,
            combined_name: None,
            verify: false,
        }
    }
}

impl Settings {
    /// Load settings from `explicit`, or from the first default location
    /// that exists. Nothing found means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        for candidate in paths::settings_candidates() {
            match fs::read_to_string(&candidate) {
                Ok(data) => {
                    tracing::debug!(path = %candidate.display(), "loading settings");
                    return Self::parse(&data, &candidate);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io(candidate, e)),
            }
        }

        tracing::debug!("no settings file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&data, path)
    }

    fn parse(data: &str, path: &Path) -> Result<Self> {
        let settings: Self = serde_json::from_str(data).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.contains(['/', '\\', '.']) {
            return Err(Error::Config(format!(
                "extension must be a bare name like \"sieve\", got {:?}",
                self.extension
            )));
        }
        if self.combined_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::Config("combined_name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "output_dir": "/srv/sieve", "verify": true }"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/srv/sieve"));
        assert!(settings.verify);
        assert!(settings.combine);
        assert_eq!(settings.extension, "sieve");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_malformed_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Json { .. })));

        fs::write(&path, r#"{ "unknown_key": 1 }"#).unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Json { .. })));

        fs::write(&path, r#"{ "extension": ".sieve" }"#).unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));
    }
}
