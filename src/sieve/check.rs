/// Offline structural check for SIEVE scripts.
///
/// Confirms a script is well-formed (balanced blocks, known tests and
/// commands, terminated statements) and that every capability it uses is
/// declared by a `require`. It does not talk to a server and does not
/// evaluate anything.
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::enums::{LogicOperator, MatchType};
use crate::sieve::lexer::{tokenize, Span, Token};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Capabilities declared by `require`.
    pub requires: BTreeSet<String>,
    /// Capabilities used but not declared.
    pub missing: BTreeSet<String>,
    pub if_blocks: usize,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn check(script: &str) -> Result<CheckReport> {
    let spans: Vec<Span> = tokenize(script)?
        .into_iter()
        .filter(|s| !matches!(s.token, Token::Comment(_)))
        .collect();

    let mut checker = Checker {
        spans: &spans,
        pos: 0,
        end: script.len(),
        used: BTreeSet::new(),
        report: CheckReport::default(),
    };

    while checker.pos < spans.len() {
        checker.command()?;
    }

    let Checker { used, mut report, .. } = checker;
    report.missing = used
        .into_iter()
        .filter(|cap| !report.requires.contains(cap))
        .collect();
    Ok(report)
}

struct Checker<'a> {
    spans: &'a [Span],
    pos: usize,
    end: usize,
    used: BTreeSet<String>,
    report: CheckReport,
}

impl<'a> Checker<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.spans.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.spans.get(self.pos).map_or(self.end, |s| s.offset)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::check(self.offset(), message)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, got {:?}", self.peek())))
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.to_lowercase();
                self.pos += 1;
                Ok(name)
            }
            other => Err(self.error(format!("expected identifier, got {other:?}"))),
        }
    }

    fn use_capability(&mut self, cap: &str) {
        self.used.insert(cap.to_string());
    }

    fn command(&mut self) -> Result<()> {
        let name = self.identifier()?;
        match name.as_str() {
            "require" => {
                let exts = self.string_or_list()?;
                self.report.requires.extend(exts);
                self.expect(Token::Semicolon, "';' after require")
            }
            "if" => {
                self.report.if_blocks += 1;
                self.test()?;
                self.block()?;
                loop {
                    match self.peek() {
                        Some(Token::Identifier(s)) if s.eq_ignore_ascii_case("elsif") => {
                            self.pos += 1;
                            self.test()?;
                            self.block()?;
                        }
                        Some(Token::Identifier(s)) if s.eq_ignore_ascii_case("else") => {
                            self.pos += 1;
                            return self.block();
                        }
                        _ => return Ok(()),
                    }
                }
            }
            "fileinto" | "reject" => {
                self.use_capability(&name);
                self.arguments()?;
                self.expect(Token::Semicolon, "';' after action")
            }
            "keep" | "stop" | "discard" | "redirect" => {
                self.arguments()?;
                self.expect(Token::Semicolon, "';' after action")
            }
            other => {
                self.pos -= 1;
                Err(self.error(format!("unknown command '{other}'")))
            }
        }
    }

    fn block(&mut self) -> Result<()> {
        self.expect(Token::LBrace, "'{'")?;
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(());
                }
                None => return Err(self.error("unexpected end of input in block")),
                _ => self.command()?,
            }
        }
    }

    /// Tagged and positional arguments of a test. At most one match type.
    fn arguments(&mut self) -> Result<()> {
        let mut has_match_type = false;
        loop {
            match self.peek() {
                Some(Token::Tag(tag)) => {
                    let is_regex = tag == ":regex";
                    if is_regex {
                        self.use_capability("regex");
                    }
                    if is_regex || MatchType::from_sieve(tag).is_some() {
                        if has_match_type {
                            return Err(self.error(format!("second match type {tag}")));
                        }
                        has_match_type = true;
                    }
                    self.pos += 1;
                }
                Some(Token::QuotedString(_) | Token::MultiLineString(_) | Token::Number(_)) => {
                    self.pos += 1;
                }
                Some(Token::LBracket) => {
                    self.string_or_list()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn test(&mut self) -> Result<()> {
        let name = self.identifier()?;
        if let Some(op) = LogicOperator::from_sieve(&name) {
            if self.test_list()? == 0 {
                return Err(self.error(format!("empty {op} list")));
            }
            return Ok(());
        }

        match name.as_str() {
            "not" => {
                if self.peek() == Some(&Token::LParen) {
                    if self.test_list()? != 1 {
                        return Err(self.error("not takes exactly one test"));
                    }
                    Ok(())
                } else {
                    self.test()
                }
            }
            "header" | "address" | "envelope" => {
                if name == "envelope" {
                    self.use_capability("envelope");
                }
                self.arguments()?;
                Ok(())
            }
            "body" => {
                self.use_capability("body");
                self.arguments()?;
                Ok(())
            }
            "exists" | "size" => {
                self.arguments()?;
                Ok(())
            }
            "true" | "false" => Ok(()),
            other => {
                self.pos -= 1;
                Err(self.error(format!("unknown test '{other}'")))
            }
        }
    }

    fn test_list(&mut self) -> Result<usize> {
        self.expect(Token::LParen, "'('")?;
        let mut count = 0;
        loop {
            if self.peek() == Some(&Token::RParen) {
                self.pos += 1;
                return Ok(count);
            }
            if count > 0 {
                self.expect(Token::Comma, "',' between tests")?;
            }
            self.test()?;
            count += 1;
        }
    }

    fn string_or_list(&mut self) -> Result<Vec<String>> {
        match self.peek() {
            Some(Token::QuotedString(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(vec![s])
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        Some(Token::QuotedString(s)) => {
                            items.push(s.clone());
                            self.pos += 1;
                        }
                        Some(Token::RBracket) if !items.is_empty() => {
                            self.pos += 1;
                            return Ok(items);
                        }
                        other => return Err(self.error(format!("bad string list at {other:?}"))),
                    }
                    match self.peek() {
                        Some(Token::Comma) => self.pos += 1,
                        Some(Token::RBracket) => {}
                        other => return Err(self.error(format!("expected ',' or ']', got {other:?}"))),
                    }
                }
            }
            other => Err(self.error(format!("expected string or list, got {other:?}"))),
        }
    }
}
