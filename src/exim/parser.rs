/// Line-oriented state machine for cPanel/Exim filter files:
///
/// ```text
/// #Nixpal
/// if
///  $header_from: contains "foo"
///  or $header_subject: begins "WHMCS"
/// then
///  deliver "\"$local_part+Nixpal\"@$domain"
///  finish
/// endif
/// ```
///
/// Blocks without a name, without a parseable condition or without a
/// recognized action are dropped. An unterminated block is flushed at end
/// of input.
use crate::exim::actions::parse_actions;
use crate::exim::conditions::parse_conditions;
use crate::model::rule::{FilterEntry, FilterSet};

/// Format tag stamped on sets parsed from the text syntax.
pub const TEXT_FORMAT: &str = "text";

/// Preamble cPanel writes at the top of every generated filter file.
const BOILERPLATE_PREFIXES: &[&str] = &[
    "# Exim filter",
    "# Do not manually",
    "headers charset",
    "if not first_delivery",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Scanning,
    InCondition,
    InAction,
}

#[derive(Debug, Default)]
struct PendingBlock {
    name: Option<String>,
    condition: Vec<String>,
    action: Vec<String>,
}

#[derive(Debug)]
pub struct TextFilterParser {
    state: State,
    pending: PendingBlock,
    entries: Vec<FilterEntry>,
}

impl Default for TextFilterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFilterParser {
    pub fn new() -> Self {
        Self {
            state: State::Scanning,
            pending: PendingBlock::default(),
            entries: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Entries committed so far.
    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || is_boilerplate(line) {
            return;
        }

        match self.state {
            State::Scanning => {
                if let Some(name) = line.strip_prefix('#') {
                    self.commit();
                    self.pending.name = Some(name.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("if") {
                    let rest = rest.trim();
                    if !rest.is_empty() {
                        self.pending.condition.push(rest.to_string());
                    }
                    self.state = State::InCondition;
                }
            }
            State::InCondition => {
                if line.starts_with("then") {
                    self.state = State::InAction;
                } else {
                    self.pending.condition.push(line.to_string());
                }
            }
            State::InAction => {
                if line.starts_with("endif") {
                    self.commit();
                } else {
                    self.pending.action.push(line.to_string());
                }
            }
        }
    }

    /// Flush whatever block is still open and return the parsed set.
    pub fn finish(mut self) -> FilterSet {
        self.commit();
        FilterSet {
            entries: self.entries,
            format: TEXT_FORMAT.to_string(),
        }
    }

    fn commit(&mut self) {
        let block = std::mem::take(&mut self.pending);
        self.state = State::Scanning;

        let name = match block.name {
            Some(name) if !name.is_empty() => name,
            _ => {
                if !block.condition.is_empty() {
                    tracing::debug!("dropping filter block without a name");
                }
                return;
            }
        };

        let rules = parse_conditions(block.condition.as_slice());
        let actions = parse_actions(block.action.as_slice());
        if rules.is_empty() || actions.is_empty() {
            tracing::debug!(
                name = %name,
                rules = rules.len(),
                actions = actions.len(),
                "dropping incomplete filter block"
            );
            return;
        }

        self.entries.push(FilterEntry {
            name,
            enabled: true,
            rules,
            actions,
        });
    }
}

fn is_boilerplate(line: &str) -> bool {
    BOILERPLATE_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Parse a whole filter file.
pub fn parse_filter_text(text: &str) -> FilterSet {
    let mut parser = TextFilterParser::new();
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::{ActionKind, JoinOp};

    const CPANEL_FILTER: &str = r#"# Exim filter - auto-generated by cPanel.
#
# Do not manually edit this file. Instead, use cPanel APIs to manipulate
# filters.
headers charset "UTF-8"

if not first_delivery and error_message then finish endif

#Nixpal
if
 $header_from: contains "nixpal"
 or $header_subject: begins "WHMCS"
then
 deliver "\"$local_part+Nixpal\"@$domain"
 finish
endif

#Logs
if $header_to: is "logs@example.com"
then
 save "$home/mail/example.com/chris/.Logs"
endif
"#;

    #[test]
    fn test_parse_cpanel_file() {
        let set = parse_filter_text(CPANEL_FILTER);
        assert_eq!(set.format, TEXT_FORMAT);
        assert_eq!(set.entries.len(), 2);

        let nixpal = &set.entries[0];
        assert_eq!(nixpal.name, "Nixpal");
        assert!(nixpal.enabled);
        assert_eq!(nixpal.rules.len(), 2);
        assert_eq!(nixpal.rules[1].opt, JoinOp::Or);
        assert_eq!(nixpal.actions.len(), 2);
        assert_eq!(nixpal.actions[0].action, ActionKind::Save);
        assert_eq!(nixpal.actions[0].dest_str(), "Nixpal");
        assert_eq!(nixpal.actions[1].action, ActionKind::Finish);

        let logs = &set.entries[1];
        assert_eq!(logs.name, "Logs");
        assert_eq!(logs.rules[0].part, "$header_to:");
        assert_eq!(logs.rules[0].val, "logs@example.com");
    }

    #[test]
    fn test_state_transitions() {
        let mut parser = TextFilterParser::new();
        assert_eq!(parser.state(), State::Scanning);
        parser.feed_line("#Name");
        assert_eq!(parser.state(), State::Scanning);
        parser.feed_line("if $header_from: contains \"a\"");
        assert_eq!(parser.state(), State::InCondition);
        parser.feed_line("# not a name while in a condition");
        assert_eq!(parser.state(), State::InCondition);
        parser.feed_line("then");
        assert_eq!(parser.state(), State::InAction);
        parser.feed_line("headers charset \"UTF-8\"");
        assert_eq!(parser.state(), State::InAction);
        parser.feed_line("save \"Box\"");
        parser.feed_line("endif");
        assert_eq!(parser.state(), State::Scanning);
        assert_eq!(parser.entries().len(), 1);
    }

    #[test]
    fn test_unterminated_block_flushed() {
        let set = parse_filter_text("#Open\nif $header_subject: is \"x\"\nthen\nsave \"Box\"\n");
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.entries[0].name, "Open");
    }

    #[test]
    fn test_incomplete_blocks_dropped() {
        let text = "if $header_from: is \"noname\"\nthen\nsave \"A\"\nendif\n\
                    #NoActions\nif $header_from: is \"b\"\nthen\npipe \"x\"\nendif\n\
                    #NoRules\nif something odd\nthen\nsave \"C\"\nendif\n\
                    #NameOnly\n\
                    #Good\nif $header_from: is \"d\"\nthen\nsave \"D\"\nendif\n";
        let set = parse_filter_text(text);
        let names: Vec<_> = set.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Good"]);
    }

    #[test]
    fn test_empty_input() {
        let set = parse_filter_text("");
        assert!(set.entries.is_empty());
        assert_eq!(set.format, TEXT_FORMAT);
    }
}
