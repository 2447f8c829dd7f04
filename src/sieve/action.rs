/// Action compiler: legacy actions -> lines of an `if` block body.
use std::collections::BTreeSet;

use crate::model::enums::ActionKind;
use crate::model::rule::Action;
use crate::sieve::ast::{ActionCommand, ActionLine};
use crate::sieve::emitter;

pub fn compile_actions(actions: &[Action]) -> Vec<ActionLine> {
    let mut lines = Vec::new();

    for action in actions {
        let dest = action.dest_str();
        match &action.action {
            ActionKind::Save => {
                let mailbox = mailbox_from_dest(dest);
                lines.push(ActionLine::Command(ActionCommand::new("fileinto", &[mailbox.as_str()])));
                lines.push(ActionLine::Comment(format!(
                    "original path: {}",
                    emitter::quote(dest)
                )));
            }
            ActionKind::Deliver => {
                lines.push(ActionLine::Command(ActionCommand::new("fileinto", &[dest])));
            }
            ActionKind::Reject => {
                lines.push(ActionLine::Command(ActionCommand::new("reject", &[dest])));
            }
            ActionKind::Finish => {
                lines.push(ActionLine::Comment(
                    "finish: stop processing (covered by the stop below)".to_string(),
                ));
            }
            ActionKind::Other(kind) => {
                tracing::debug!(action = %kind, dest, "unsupported action left as a comment");
                lines.push(ActionLine::Comment(format!(
                    "unsupported action {} dest={}",
                    emitter::quote(kind),
                    emitter::quote(dest)
                )));
            }
        }
    }

    lines
}

/// Extensions needed by the compiled actions.
pub fn required_extensions(actions: &[Action]) -> BTreeSet<&'static str> {
    actions
        .iter()
        .filter_map(|a| a.action.required_extension())
        .collect()
}

/// Mailbox name from a cPanel save path:
/// `$home/mail/example.com/chris/.Nixpal` -> `Nixpal`.
pub fn mailbox_from_dest(dest: &str) -> String {
    if dest.is_empty() {
        return "INBOX".to_string();
    }

    let base = dest.rsplit('/').next().unwrap_or(dest).trim();
    let base = base.strip_prefix('.').unwrap_or(base);

    if base.is_empty() {
        dest.to_string()
    } else {
        base.to_string()
    }
}
