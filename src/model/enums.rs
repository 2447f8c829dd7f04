use serde::{Deserialize, Serialize};
use std::fmt;

/// SIEVE match type used by `header`, `address` and `body` tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    Is,
    Contains,
    Matches,
}

impl MatchType {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Is => ":is",
            Self::Contains => ":contains",
            Self::Matches => ":matches",
        }
    }

    pub fn from_sieve(s: &str) -> Option<Self> {
        match s {
            ":is" => Some(Self::Is),
            ":contains" => Some(Self::Contains),
            ":matches" => Some(Self::Matches),
            _ => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOperator {
    AllOf,
    AnyOf,
}

impl LogicOperator {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::AllOf => "allof",
            Self::AnyOf => "anyof",
        }
    }

    pub fn from_sieve(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "allof" => Some(Self::AllOf),
            "anyof" => Some(Self::AnyOf),
            _ => None,
        }
    }
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}

/// Which SIEVE test a legacy field selector maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    Header,
    Address,
    Body,
}

impl TestKind {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Address => "address",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}

/// Boolean join marker of a rule relative to the one before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JoinOp {
    And,
    #[default]
    Or,
}

impl JoinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Anything that is not `and` joins as `or`, including an empty marker.
    pub fn from_keyword(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("and") {
            Self::And
        } else {
            Self::Or
        }
    }
}

impl From<String> for JoinOp {
    fn from(s: String) -> Self {
        Self::from_keyword(&s)
    }
}

impl From<JoinOp> for String {
    fn from(op: JoinOp) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for JoinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag of a legacy filter action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Save,
    Deliver,
    Reject,
    Finish,
    /// Unrecognized action, keeps the original keyword for diagnostics.
    Other(String),
}

impl ActionKind {
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "save" => Self::Save,
            "deliver" => Self::Deliver,
            "reject" => Self::Reject,
            "finish" => Self::Finish,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Save => "save",
            Self::Deliver => "deliver",
            Self::Reject => "reject",
            Self::Finish => "finish",
            Self::Other(s) => s,
        }
    }

    /// SIEVE capability the compiled action depends on, if any.
    pub fn required_extension(&self) -> Option<&'static str> {
        match self {
            Self::Save | Self::Deliver => Some("fileinto"),
            Self::Reject => Some("reject"),
            Self::Finish | Self::Other(_) => None,
        }
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        Self::from_keyword(&s)
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
