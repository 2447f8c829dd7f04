/// Condition-region parser.
///
/// Handles the flat form cPanel writes:
///
/// ```text
/// $header_from: contains "foo"
/// or $header_subject: begins "WHMCS"
/// and $header_to: is "me@example.com"
/// ```
///
/// Clauses are split on the earliest ` or ` / ` and `; clauses that lack
/// a `:` or a quoted value are skipped.
use crate::model::enums::JoinOp;
use crate::model::rule::Rule;

pub fn parse_conditions<S: AsRef<str>>(lines: &[S]) -> Vec<Rule> {
    let joined = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");

    let mut rules = Vec::new();
    let mut rest = joined.trim();
    let mut first = true;

    while !rest.is_empty() {
        let mut opt = JoinOp::Or;
        if !first {
            if let Some(tail) = strip_keyword(rest, "or ") {
                rest = tail.trim_start();
            } else if let Some(tail) = strip_keyword(rest, "and ") {
                opt = JoinOp::And;
                rest = tail.trim_start();
            }
        }
        first = false;

        if rest.is_empty() {
            break;
        }

        // ASCII lowering keeps byte offsets aligned with `rest`.
        let lower = rest.to_ascii_lowercase();
        let cut = [lower.find(" or "), lower.find(" and ")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());

        let clause = rest[..cut].trim();
        rest = rest[cut..].trim_start();

        match parse_clause(clause, opt) {
            Some(rule) => rules.push(rule),
            None => tracing::debug!(clause, "skipping unparseable condition"),
        }
    }

    rules
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &s[keyword.len()..])
}

/// `$header_from: contains "foo"` -> Rule { part: "$header_from:", match: "contains", val: "foo" }
fn parse_clause(clause: &str, opt: JoinOp) -> Option<Rule> {
    let colon = clause.find(':')?;
    let part = clause[..=colon].trim();
    let rest = clause[colon + 1..].trim();

    let quote = rest.find('"')?;
    let after = &rest[quote + 1..];
    let val = &after[..after.find('"')?];

    // Operator words run up to the quoted value, so `does not contain`
    // survives as one keyword.
    let match_op = rest[..quote]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if match_op.is_empty() {
        return None;
    }

    Some(Rule {
        part: part.to_string(),
        match_op,
        val: val.to_string(),
        opt,
    })
}
