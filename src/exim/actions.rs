/// Action-region parser: `finish`, `deliver "..."` and `save "..."`.
/// Everything else in the region (nested ifs, `pipe`, headers edits) is
/// dropped.
use crate::model::enums::ActionKind;
use crate::model::rule::Action;

/// Exim variable cPanel uses to deliver into a `user+folder` address.
const LOCAL_PART_MARKER: &str = "$local_part+";

pub fn parse_actions<S: AsRef<str>>(lines: &[S]) -> Vec<Action> {
    let mut actions = Vec::new();

    for line in lines {
        let line: &str = line.as_ref();
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        if lower.starts_with("finish") {
            actions.push(Action::new(ActionKind::Finish, None));
        } else if lower.starts_with("deliver ") {
            let Some(arg) = first_quoted(line) else {
                continue;
            };
            if let Some(idx) = arg.find(LOCAL_PART_MARKER) {
                // deliver "\"$local_part+Nixpal\"@$domain" files into Nixpal
                let rest = &arg[idx + LOCAL_PART_MARKER.len()..];
                let end = rest.find(['"', '@']).unwrap_or(rest.len());
                let mailbox = rest[..end].trim();
                if !mailbox.is_empty() {
                    actions.push(Action::new(ActionKind::Save, Some(mailbox)));
                }
            } else {
                actions.push(Action::new(ActionKind::Deliver, Some(&arg)));
            }
        } else if lower.starts_with("save ") {
            if let Some(arg) = first_quoted(line) {
                actions.push(Action::new(ActionKind::Save, Some(&arg)));
            }
        } else {
            tracing::debug!(line, "ignoring unsupported filter action");
        }
    }

    actions
}

/// First double-quoted argument with `\"` and `\\` unescaped.
/// Returns `None` for a missing, unterminated or empty argument.
fn first_quoted(s: &str) -> Option<String> {
    let start = s.find('"')?;
    let mut out = String::new();
    let mut chars = s[start + 1..].chars();

    loop {
        match chars.next()? {
            '\\' => out.push(chars.next()?),
            '"' => break,
            c => out.push(c),
        }
    }

    (!out.is_empty()).then_some(out)
}
