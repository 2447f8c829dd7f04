/// Script combiner: merges the per-entry scripts of one mailbox into a
/// single script with one `require` header on top.
use std::collections::BTreeSet;

use crate::model::script::SieveScript;
use crate::sieve::emitter;

pub fn combine_scripts(name: &str, scripts: &[SieveScript]) -> SieveScript {
    let mut extensions = BTreeSet::new();
    let mut chunks: Vec<String> = Vec::new();

    for script in scripts {
        let mut body = Vec::new();
        for line in script.content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("require [") {
                extensions.extend(parse_require_list(trimmed));
                continue;
            }
            body.push(line);
        }

        let body = trim_blank_lines(&body);
        if body.is_empty() {
            tracing::debug!(script = %script.name, "skipping empty script body");
            continue;
        }

        chunks.push(format!("# Filter: {}", emitter::single_line(&script.name)));
        chunks.extend(body.iter().map(|l| l.to_string()));
        chunks.push(String::new());
    }

    let mut out = String::new();
    if let Some(require) = emitter::emit_require(&extensions) {
        out.push_str(&require);
        out.push_str("\n\n");
    }
    out.push_str(&chunks.join("\n"));

    SieveScript::new(name, out)
}

/// `require ["fileinto", "reject"];` -> `fileinto`, `reject`
fn parse_require_list(line: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (line.find('['), line.find(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    line[start + 1..end]
        .split(',')
        .map(|token| token.trim().trim_matches('"').to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

fn trim_blank_lines<'a, 'b>(lines: &'b [&'a str]) -> &'b [&'a str] {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |i| i + 1);
    &lines[start..end]
}
