/// Typed SIEVE test expressions and action lines produced by the compilers.
/// Rendering lives in `emitter`.
use crate::model::enums::{LogicOperator, MatchType, TestKind};

/// A test expression in an `if` condition.
#[derive(Debug, Clone, PartialEq)]
pub enum TestExpr {
    /// `allof (...)` / `anyof (...)`
    Join(LogicOperator, Vec<TestExpr>),
    /// `not (<test>)`
    Not(Box<TestExpr>),
    /// `header :op "Name" "key"` or `address :op ["A", "B"] "key"`
    Header {
        kind: TestKind,
        match_type: MatchType,
        header_names: Vec<String>,
        key: String,
    },
    /// `body :op "key"`
    Body { match_type: MatchType, key: String },
    /// Fail-soft placeholder: `true` / `false` followed by a bracket comment.
    Placeholder { value: bool, note: String },
}

impl TestExpr {
    /// Whether the expression needs the `body` extension.
    pub fn uses_body(&self) -> bool {
        match self {
            Self::Join(_, tests) => tests.iter().any(TestExpr::uses_body),
            Self::Not(inner) => inner.uses_body(),
            Self::Body { .. } => true,
            Self::Header { .. } | Self::Placeholder { .. } => false,
        }
    }
}

/// A simple action command like `stop;`, `fileinto "X";`, `reject "msg";`
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCommand {
    pub name: String,
    pub arguments: Vec<String>,
}

impl ActionCommand {
    pub fn new(name: &str, arguments: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One line inside an `if` block body.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionLine {
    Command(ActionCommand),
    Comment(String),
}
