use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::script::SieveScript;

pub fn load_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write each script to `<dir>/<name>.<extension>`, creating `dir` as
/// needed. Names that collide after sanitizing get `-2`, `-3`, ... suffixes.
pub fn write_scripts(scripts: &[SieveScript], dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut taken = HashSet::new();
    let mut written = Vec::with_capacity(scripts.len());

    for script in scripts {
        let base = sanitize_name(&script.name);
        let mut stem = base.clone();
        let mut n = 1;
        while !taken.insert(stem.clone()) {
            n += 1;
            stem = format!("{base}-{n}");
        }

        let path = dir.join(format!("{stem}.{extension}"));
        fs::write(&path, &script.content).map_err(|e| Error::io(&path, e))?;
        tracing::info!(path = %path.display(), "wrote script");
        written.push(path);
    }

    Ok(written)
}

/// Make a filter name usable as a file stem.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => cleaned,
    }
}
