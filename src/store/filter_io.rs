use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::exim::parser::parse_filter_text;
use crate::model::rule::FilterSet;

/// Load a filter file in either cPanel format: `filter.yaml` records or the
/// procedural Exim `filter` text.
pub fn load_filter_set(path: &Path) -> Result<FilterSet> {
    let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    if is_yaml_path(path) || looks_like_yaml(&data) {
        tracing::debug!(path = %path.display(), "reading YAML filter record");
        parse_filter_yaml(&data).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        tracing::debug!(path = %path.display(), "reading text filter");
        Ok(parse_filter_text(&data))
    }
}

pub fn parse_filter_yaml(data: &str) -> Result<FilterSet, serde_yaml::Error> {
    if data.trim().is_empty() {
        return Ok(FilterSet::default());
    }
    serde_yaml::from_str(data)
}

fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// First line that is not blank or a `#` comment opens a YAML document.
fn looks_like_yaml(data: &str) -> bool {
    data.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .is_some_and(|l| l.starts_with("---") || l.starts_with("filter:"))
}
