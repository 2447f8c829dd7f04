/// Emit SIEVE script text from AST nodes.
use crate::sieve::ast::*;

const INDENT: &str = "    ";

/// Render a test expression. Joins put one clause per line:
///
/// ```text
/// anyof (
///     header :contains "Subject" "a",
///     body :contains "b"
/// )
/// ```
pub fn emit_test(expr: &TestExpr) -> String {
    let mut out = String::new();
    emit_test_expr(&mut out, expr);
    out
}

fn emit_test_expr(out: &mut String, expr: &TestExpr) {
    match expr {
        TestExpr::Join(op, tests) => {
            out.push_str(op.as_sieve());
            out.push_str(" (\n");
            for (i, test) in tests.iter().enumerate() {
                out.push_str(INDENT);
                emit_test_expr(out, test);
                if i + 1 < tests.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push(')');
        }
        TestExpr::Not(inner) => {
            out.push_str("not (");
            emit_test_expr(out, inner);
            out.push(')');
        }
        TestExpr::Header {
            kind,
            match_type,
            header_names,
            key,
        } => {
            out.push_str(kind.as_sieve());
            out.push(' ');
            out.push_str(match_type.as_sieve());
            out.push(' ');
            emit_string_or_list(out, header_names);
            out.push(' ');
            out.push_str(&quote(key));
        }
        TestExpr::Body { match_type, key } => {
            out.push_str("body ");
            out.push_str(match_type.as_sieve());
            out.push(' ');
            out.push_str(&quote(key));
        }
        TestExpr::Placeholder { value, note } => {
            out.push_str(if *value { "true" } else { "false" });
            out.push_str(" /* ");
            // A stray terminator would end the bracket comment early.
            out.push_str(&single_line(note).replace("*/", "* /"));
            out.push_str(" */");
        }
    }
}

fn emit_string_or_list(out: &mut String, items: &[String]) {
    if items.len() == 1 {
        out.push_str(&quote(&items[0]));
    } else {
        out.push('[');
        out.push_str(&quote_list(items));
        out.push(']');
    }
}

/// `a`, `b` -> `"a", "b"`
pub fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| quote(s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote a value as a SIEVE string literal, kept on one line.
pub fn quote(s: &str) -> String {
    format!(
        "\"{}\"",
        single_line(s).replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// CR and LF replaced by spaces; every emitted construct stays on one line.
pub fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

/// `require ["a", "b"];` with the names sorted, or `None` when empty.
pub fn emit_require<I, S>(extensions: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = extensions
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    if names.is_empty() {
        return None;
    }
    names.sort();
    names.dedup();
    Some(format!("require [{}];", quote_list(&names)))
}

/// Render one block line at the given indent level, newline included.
pub fn emit_action_line(out: &mut String, line: &ActionLine, indent: usize) {
    out.push_str(&INDENT.repeat(indent));
    match line {
        ActionLine::Command(action) => {
            out.push_str(&action.name);
            for arg in &action.arguments {
                out.push(' ');
                out.push_str(&quote(arg));
            }
            out.push(';');
        }
        ActionLine::Comment(text) => {
            out.push_str("# ");
            out.push_str(&single_line(text));
        }
    }
    out.push('\n');
}
