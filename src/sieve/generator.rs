/// Script generator: one SIEVE script per filter entry.
use std::collections::BTreeSet;

use crate::model::rule::{FilterEntry, FilterSet};
use crate::model::script::SieveScript;
use crate::sieve::ast::{ActionCommand, ActionLine};
use crate::sieve::emitter;
use crate::sieve::{action, condition};

pub const NO_RULES_COMMENT: &str = "# Filter has no rules; nothing to match.";

/// Compile every entry of a filter set, in order.
pub fn convert_filters(set: &FilterSet) -> Vec<SieveScript> {
    set.entries.iter().map(generate_entry).collect()
}

pub fn generate_entry(entry: &FilterEntry) -> SieveScript {
    let content = if entry.rules.is_empty() {
        format!("{NO_RULES_COMMENT}\n")
    } else {
        emit_entry(entry)
    };

    let content = if entry.enabled {
        content
    } else {
        comment_out(&content, entry.enabled)
    };

    SieveScript::new(entry.name.clone(), content)
}

fn emit_entry(entry: &FilterEntry) -> String {
    let compiled = condition::compile_conditions(&entry.rules);

    let mut extensions: BTreeSet<&str> = action::required_extensions(&entry.actions);
    if compiled.uses_body {
        extensions.insert("body");
    }

    let mut out = String::new();
    if let Some(require) = emitter::emit_require(&extensions) {
        out.push_str(&require);
        out.push_str("\n\n");
    }

    out.push_str("if ");
    out.push_str(&compiled.render());
    out.push_str(" {\n");

    if entry.actions.is_empty() {
        emitter::emit_action_line(
            &mut out,
            &ActionLine::Comment("no actions defined in original filter".to_string()),
            1,
        );
    } else {
        for line in action::compile_actions(&entry.actions) {
            emitter::emit_action_line(&mut out, &line, 1);
        }
    }
    emitter::emit_action_line(&mut out, &ActionLine::Command(ActionCommand::new("stop", &[])), 1);
    out.push_str("}\n");

    out
}

/// Neutralize a disabled entry while keeping it readable: every non-blank
/// line gets a `# ` prefix, blank lines stay blank.
fn comment_out(content: &str, enabled: bool) -> String {
    let mut lines = vec![format!(
        "# NOTE: this filter was disabled in the source (enabled={})",
        u8::from(enabled)
    )];
    lines.extend(content.split('\n').map(|line| {
        if line.trim().is_empty() {
            String::new()
        } else {
            format!("# {line}")
        }
    }));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::{ActionKind, JoinOp};
    use crate::model::rule::{Action, Rule};

    fn entry(rules: Vec<Rule>, actions: Vec<Action>, enabled: bool) -> FilterEntry {
        FilterEntry {
            name: "Test".to_string(),
            enabled,
            rules,
            actions,
        }
    }

    fn from_rule() -> Rule {
        Rule::new("$header_from:", "contains", "foo", JoinOp::Or)
    }

    #[test]
    fn test_full_entry() {
        let script = generate_entry(&entry(
            vec![from_rule()],
            vec![
                Action::new(ActionKind::Save, Some("Nixpal")),
                Action::new(ActionKind::Finish, None),
            ],
            true,
        ));
        assert_eq!(script.name, "Test");
        assert_eq!(
            script.content,
            "require [\"fileinto\"];\n\n\
             if header :contains \"From\" \"foo\" {\n\
             \x20   fileinto \"Nixpal\";\n\
             \x20   # original path: \"Nixpal\"\n\
             \x20   # finish: stop processing (covered by the stop below)\n\
             \x20   stop;\n\
             }\n"
        );
    }

    #[test]
    fn test_zero_rules_is_comment_only() {
        let script = generate_entry(&entry(
            vec![],
            vec![Action::new(ActionKind::Save, Some("X"))],
            true,
        ));
        assert_eq!(script.content, format!("{NO_RULES_COMMENT}\n"));
        assert!(!script.content.contains("if "));
        assert!(!script.content.contains("require"));
    }

    #[test]
    fn test_zero_actions_placeholder() {
        let script = generate_entry(&entry(vec![from_rule()], vec![], true));
        assert!(!script.content.contains("require"));
        assert!(script.content.contains("    # no actions defined in original filter\n    stop;\n}"));
    }

    #[test]
    fn test_body_and_reject_requires_sorted() {
        let script = generate_entry(&entry(
            vec![Rule::new("$message_body", "contains", "viagra", JoinOp::Or)],
            vec![
                Action::new(ActionKind::Reject, Some("no spam")),
                Action::new(ActionKind::Deliver, Some("Junk")),
            ],
            true,
        ));
        assert!(script
            .content
            .starts_with("require [\"body\", \"fileinto\", \"reject\"];\n\n"));
    }

    #[test]
    fn test_disabled_entry_fully_commented() {
        let script = generate_entry(&entry(
            vec![from_rule()],
            vec![Action::new(ActionKind::Save, Some("Nixpal"))],
            false,
        ));
        let mut lines = script.content.lines();
        assert_eq!(
            lines.next(),
            Some("# NOTE: this filter was disabled in the source (enabled=0)")
        );
        assert_eq!(lines.next(), Some("# require [\"fileinto\"];"));
        assert_eq!(lines.next(), Some(""));
        for line in script.content.lines().filter(|l| !l.is_empty()) {
            assert!(line.starts_with('#'), "{line}");
        }
    }

    #[test]
    fn test_convert_keeps_order() {
        let set = FilterSet {
            entries: vec![
                FilterEntry {
                    name: "A".into(),
                    ..entry(vec![from_rule()], vec![], true)
                },
                FilterEntry {
                    name: "B".into(),
                    ..entry(vec![], vec![], false)
                },
            ],
            format: "2.2".into(),
        };
        let names: Vec<_> = convert_filters(&set).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
