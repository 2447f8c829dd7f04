/// Condition compiler: legacy rules -> SIEVE test expression.
///
/// A rule list carries one join marker per rule but SIEVE has no
/// precedence between `allof` and `anyof` at the same level, so the whole
/// list gets a single operator: `allof` only when every marker is `and`,
/// `anyof` otherwise, unrecognized markers included. `a or b and c`
/// therefore compiles to `anyof (a, b, c)`.
///
/// Unsupported forms degrade instead of failing. Regex operators and
/// `matches` patterns that are not simple anchors become `false`
/// placeholders (the filter never fires); an unknown operator or an empty
/// value becomes a `true` placeholder (the filter always fires). Review
/// converted scripts for `true /*` before deploying them.
use crate::model::enums::{JoinOp, LogicOperator, MatchType, TestKind};
use crate::model::rule::Rule;
use crate::sieve::ast::TestExpr;
use crate::sieve::emitter;

/// Regex operators that have no SIEVE equivalent without the `regex` extension.
const REGEX_OPERATORS: &[&str] = &["matches_regex", "does not match"];

const REGEX_META: &[char] = &['.', '*', '+', '?', '[', ']', '(', ')', '|', '\\'];

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    pub expr: TestExpr,
    pub uses_body: bool,
}

impl CompiledCondition {
    fn new(expr: TestExpr) -> Self {
        let uses_body = expr.uses_body();
        Self { expr, uses_body }
    }

    pub fn render(&self) -> String {
        emitter::emit_test(&self.expr)
    }
}

/// Compile all rules of one filter entry.
pub fn compile_conditions(rules: &[Rule]) -> CompiledCondition {
    match rules {
        [] => CompiledCondition::new(TestExpr::Placeholder {
            value: false,
            note: "no rules".to_string(),
        }),
        [rule] => compile_rule(rule),
        _ => {
            let op = join_operator(rules);
            let tests = rules.iter().map(|r| compile_rule(r).expr).collect();
            CompiledCondition::new(TestExpr::Join(op, tests))
        }
    }
}

/// The single operator applied to a whole rule list.
pub fn join_operator(rules: &[Rule]) -> LogicOperator {
    if rules.iter().all(|r| r.opt == JoinOp::And) {
        LogicOperator::AllOf
    } else {
        LogicOperator::AnyOf
    }
}

/// Compile one rule on its own.
pub fn compile_rule(rule: &Rule) -> CompiledCondition {
    let match_op = rule.match_op.trim().to_lowercase();

    if REGEX_OPERATORS.contains(&match_op.as_str()) {
        tracing::debug!(rule = %describe(rule), "regex rule replaced by false");
        return CompiledCondition::new(TestExpr::Placeholder {
            value: false,
            note: format!("unsupported regex rule: {}", describe(rule)),
        });
    }

    let field = map_part(&rule.part);

    if match_op == "matches" {
        return match simple_regex_to_glob(&rule.val) {
            Some(glob) => CompiledCondition::new(field.test(MatchType::Matches, glob)),
            None => {
                tracing::debug!(rule = %describe(rule), "non-glob pattern replaced by false");
                CompiledCondition::new(TestExpr::Placeholder {
                    value: false,
                    note: format!("unsupported match pattern: {}", describe(rule)),
                })
            }
        };
    }

    match map_match(&match_op, &rule.val) {
        Some(mapping) => {
            let test = field.test(mapping.match_type, mapping.pattern);
            let expr = if mapping.negated {
                TestExpr::Not(Box::new(test))
            } else {
                test
            };
            CompiledCondition::new(expr)
        }
        None => {
            tracing::debug!(rule = %describe(rule), "unknown operator replaced by true");
            CompiledCondition::new(TestExpr::Placeholder {
                value: true,
                note: format!("unsupported match: {}", describe(rule)),
            })
        }
    }
}

fn describe(rule: &Rule) -> String {
    format!("{} {} {}", rule.part, rule.match_op, emitter::quote(&rule.val))
}

/// Reduce an anchored regex without metacharacters to a `:matches` glob.
///
/// `^X$` -> `X`, `^X` -> `X*`, `X$` -> `*X`. Anything else is `None`.
pub fn simple_regex_to_glob(pattern: &str) -> Option<String> {
    if pattern.is_empty() || pattern.contains(REGEX_META) {
        return None;
    }

    let anchored_start = pattern.starts_with('^');
    let anchored_end = pattern.ends_with('$');

    if anchored_start && anchored_end && pattern.len() > 2 {
        Some(pattern[1..pattern.len() - 1].to_string())
    } else if anchored_start && pattern.len() > 1 {
        Some(format!("{}*", &pattern[1..]))
    } else if anchored_end && pattern.len() > 1 {
        Some(format!("*{}", &pattern[..pattern.len() - 1]))
    } else {
        None
    }
}

/// Where a legacy field selector points in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub kind: TestKind,
    pub headers: Vec<String>,
}

impl Field {
    fn new(kind: TestKind, headers: &[&str]) -> Self {
        Self {
            kind,
            headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }

    /// Test kind used for the given match type.
    ///
    /// `$header_from:` expands to the raw header including the display
    /// name, so substring matches on address fields stay `header` tests.
    pub fn test_kind(&self, match_type: MatchType) -> TestKind {
        match (self.kind, match_type) {
            (TestKind::Address, MatchType::Contains) => TestKind::Header,
            (kind, _) => kind,
        }
    }

    fn test(&self, match_type: MatchType, key: String) -> TestExpr {
        match self.test_kind(match_type) {
            TestKind::Body => TestExpr::Body { match_type, key },
            kind => TestExpr::Header {
                kind,
                match_type,
                header_names: self.headers.clone(),
                key,
            },
        }
    }
}

/// Map a cPanel `part` like `$header_subject:` or `$message_body`.
pub fn map_part(part: &str) -> Field {
    let lower = part.trim().to_lowercase();
    let p = lower.strip_prefix("$header_").unwrap_or(&lower);
    let p = p.strip_prefix('$').unwrap_or(p);
    let p = p.strip_suffix(':').unwrap_or(p).trim();

    match p {
        "from" | "h_from" => Field::new(TestKind::Address, &["From"]),
        "to" | "h_to" => Field::new(TestKind::Address, &["To"]),
        "subject" | "h_subject" => Field::new(TestKind::Header, &["Subject"]),
        "any recipient" | "any_recipient" | "anyrecipient" => {
            Field::new(TestKind::Address, &["To", "Cc", "Bcc"])
        }
        "reply" | "reply-to" | "reply_to" => Field::new(TestKind::Header, &["Reply-To"]),
        "body" | "message_body" => Field::new(TestKind::Body, &[]),
        "any header" | "any_header" | "anyheader" => Field::new(
            TestKind::Header,
            &["From", "To", "Cc", "Bcc", "Subject", "Reply-To"],
        ),
        "" => Field::new(TestKind::Header, &["Subject"]),
        other => Field {
            kind: TestKind::Header,
            headers: vec![title_case_header(other)],
        },
    }
}

/// `x-spam-flag` -> `X-Spam-Flag`
fn title_case_header(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchMapping {
    pub match_type: MatchType,
    pub negated: bool,
    pub pattern: String,
}

/// Map a cPanel operator keyword. An empty value maps to nothing.
pub fn map_match(match_op: &str, val: &str) -> Option<MatchMapping> {
    if val.is_empty() {
        return None;
    }

    let (match_type, negated, pattern) = match match_op {
        "contains" => (MatchType::Contains, false, val.to_string()),
        "does not contain" | "does not contains" => (MatchType::Contains, true, val.to_string()),
        "equals" | "is" => (MatchType::Is, false, val.to_string()),
        "does not equal" | "is not" => (MatchType::Is, true, val.to_string()),
        "begins" | "begins with" => (MatchType::Matches, false, format!("{val}*")),
        "does not begin" | "does not begin with" => (MatchType::Matches, true, format!("{val}*")),
        "ends" | "ends with" => (MatchType::Matches, false, format!("*{val}")),
        "does not end" | "does not end with" => (MatchType::Matches, true, format!("*{val}")),
        _ => return None,
    };

    Some(MatchMapping {
        match_type,
        negated,
        pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(part: &str, match_op: &str, val: &str, opt: JoinOp) -> Rule {
        Rule::new(part, match_op, val, opt)
    }

    fn render_one(part: &str, match_op: &str, val: &str) -> String {
        compile_rule(&rule(part, match_op, val, JoinOp::Or)).render()
    }

    #[test]
    fn test_glob_reduction() {
        assert_eq!(simple_regex_to_glob("^Suspended:").as_deref(), Some("Suspended:*"));
        assert_eq!(simple_regex_to_glob("^Suspended:$").as_deref(), Some("Suspended:"));
        assert_eq!(simple_regex_to_glob("Suspended:$").as_deref(), Some("*Suspended:"));
        assert_eq!(simple_regex_to_glob("Sus*ended"), None);
        assert_eq!(simple_regex_to_glob("^a.b"), None);
        assert_eq!(simple_regex_to_glob("plain"), None);
        assert_eq!(simple_regex_to_glob(""), None);
    }

    #[test]
    fn test_is_on_from_is_address_test() {
        assert_eq!(
            render_one("$header_from:", "is", "a@b.com"),
            r#"address :is "From" "a@b.com""#
        );
    }

    #[test]
    fn test_contains_on_from_is_header_test() {
        assert_eq!(
            render_one("$header_from:", "contains", "foo"),
            r#"header :contains "From" "foo""#
        );
    }

    #[test]
    fn test_operator_table() {
        assert_eq!(
            render_one("$header_subject:", "does not contain", "x"),
            r#"not (header :contains "Subject" "x")"#
        );
        assert_eq!(
            render_one("$header_subject:", "begins", "WHMCS"),
            r#"header :matches "Subject" "WHMCS*""#
        );
        assert_eq!(
            render_one("$header_subject:", "does not end with", "!"),
            r#"not (header :matches "Subject" "*!")"#
        );
        assert_eq!(
            render_one("$header_to:", "does not equal", "me@x.org"),
            r#"not (address :is "To" "me@x.org")"#
        );
        assert_eq!(
            render_one("$header_to:", "ends", "@x.org"),
            r#"address :matches "To" "*@x.org""#
        );
    }

    #[test]
    fn test_body_sets_flag() {
        let compiled = compile_rule(&rule("$message_body", "does not contain", "unsubscribe", JoinOp::Or));
        assert!(compiled.uses_body);
        assert_eq!(compiled.render(), r#"not (body :contains "unsubscribe")"#);

        let compiled = compile_rule(&rule("$message_body", "matches", "^Hello", JoinOp::Or));
        assert!(compiled.uses_body);
        assert_eq!(compiled.render(), r#"body :matches "Hello*""#);
    }

    #[test]
    fn test_matches_glob_on_headers() {
        assert_eq!(
            render_one("$header_subject:", "matches", "^Suspended:"),
            r#"header :matches "Subject" "Suspended:*""#
        );
        assert_eq!(
            render_one("$header_from:", "matches", "@example.com$"),
            r#"address :matches "From" "*@example.com""#
        );
    }

    #[test]
    fn test_unsupported_forms_are_placeholders() {
        let regex = render_one("$header_subject:", "matches_regex", "^a.*b");
        assert!(regex.starts_with("false /* "), "{regex}");

        let complex = render_one("$header_subject:", "matches", "a|b");
        assert!(complex.starts_with("false /* "), "{complex}");

        let unknown = render_one("$header_subject:", "sounds like", "x");
        assert!(unknown.starts_with("true /* "), "{unknown}");

        let empty = render_one("$header_subject:", "contains", "");
        assert!(empty.starts_with("true /* "), "{empty}");
    }

    #[test]
    fn test_field_mapping() {
        assert_eq!(map_part("$header_subject:").headers, vec!["Subject"]);
        assert_eq!(map_part("$message_body").kind, TestKind::Body);
        assert_eq!(map_part("body").kind, TestKind::Body);
        assert_eq!(map_part("$h_to:").headers, vec!["To"]);
        assert_eq!(map_part("any recipient").headers, vec!["To", "Cc", "Bcc"]);
        assert_eq!(map_part("$header_reply-to:").headers, vec!["Reply-To"]);
        assert_eq!(map_part("any_header").headers.len(), 6);
        assert_eq!(map_part("$header_:").headers, vec!["Subject"]);
        let custom = map_part("$header_x-spam-flag:");
        assert_eq!(custom.kind, TestKind::Header);
        assert_eq!(custom.headers, vec!["X-Spam-Flag"]);
    }

    #[test]
    fn test_any_recipient_list() {
        assert_eq!(
            render_one("any_recipient", "is", "a@b.c"),
            r#"address :is ["To", "Cc", "Bcc"] "a@b.c""#
        );
    }

    #[test]
    fn test_join_collapses_mixed_to_anyof() {
        let rules = vec![
            rule("$header_from:", "contains", "a", JoinOp::Or),
            rule("$header_subject:", "contains", "b", JoinOp::And),
        ];
        let text = compile_conditions(&rules).render();
        assert!(text.starts_with("anyof ("), "{text}");
        assert!(!text.contains("allof"));
    }

    #[test]
    fn test_join_all_and_is_allof() {
        let rules = vec![
            rule("$header_from:", "contains", "a", JoinOp::And),
            rule("$header_subject:", "contains", "b", JoinOp::And),
        ];
        assert_eq!(
            compile_conditions(&rules).render(),
            "allof (\n    header :contains \"From\" \"a\",\n    header :contains \"Subject\" \"b\"\n)"
        );
    }

    #[test]
    fn test_unknown_join_marker_counts_as_or() {
        let rules = vec![
            rule("$header_from:", "contains", "a", JoinOp::from_keyword("and")),
            rule("$header_subject:", "contains", "b", JoinOp::from_keyword("xyz")),
        ];
        assert_eq!(rules[1].opt, JoinOp::Or);
        assert_eq!(join_operator(&rules), LogicOperator::AnyOf);
        assert!(compile_conditions(&rules).render().starts_with("anyof ("));
    }

    #[test]
    fn test_multi_rule_body_flag() {
        let rules = vec![
            rule("$header_from:", "contains", "a", JoinOp::Or),
            rule("$message_body", "contains", "b", JoinOp::Or),
        ];
        assert!(compile_conditions(&rules).uses_body);
    }
}
