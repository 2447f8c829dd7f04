use serde::{Deserialize, Deserializer, Serialize};

use crate::model::enums::{ActionKind, JoinOp};

/// One atomic match condition of a legacy filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Raw field selector, e.g. `$header_from:` or `$message_body`.
    #[serde(default)]
    pub part: String,
    /// Operator keyword, e.g. `contains`, `begins`, `matches`.
    #[serde(default, rename = "match")]
    pub match_op: String,
    #[serde(default)]
    pub val: String,
    #[serde(default)]
    pub opt: JoinOp,
}

impl Rule {
    pub fn new(part: &str, match_op: &str, val: &str, opt: JoinOp) -> Self {
        Self {
            part: part.to_string(),
            match_op: match_op.to_string(),
            val: val.to_string(),
            opt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
}

impl Action {
    pub fn new(action: ActionKind, dest: Option<&str>) -> Self {
        Self {
            action,
            dest: dest.map(str::to_string),
        }
    }

    pub fn dest_str(&self) -> &str {
        self.dest.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    #[serde(default, rename = "filtername")]
    pub name: String,
    #[serde(default = "enabled_default", deserialize_with = "flag_from_int_or_bool")]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Default for FilterEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            rules: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// All filter entries read from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default, rename = "filter")]
    pub entries: Vec<FilterEntry>,
    /// Informational format tag (`text` for the procedural syntax).
    #[serde(default, rename = "version", deserialize_with = "string_from_scalar")]
    pub format: String,
}

fn enabled_default() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

fn flag_from_int_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Null => true,
        Scalar::Bool(b) => b,
        Scalar::Int(n) => n != 0,
        Scalar::Float(n) => n != 0.0,
        Scalar::Str(s) => !matches!(s.trim(), "" | "0" | "false" | "no"),
    })
}

// cPanel writes `version: 2.2` unquoted, which YAML reads as a number.
fn string_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Null => String::new(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Str(s) => s,
    })
}
