/// SIEVE script tokenizer (RFC 5228), enough of it to read back what the
/// generator writes plus the usual hand-written scripts.
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A `:tag` like `:is`, `:contains`, `:over`, `:domain`, etc.
    Tag(String),
    /// An unquoted identifier like `if`, `header`, `allof`, `fileinto`, etc.
    Identifier(String),
    /// A double-quoted string, escapes resolved.
    QuotedString(String),
    /// A `text:` multi-line string.
    MultiLineString(String),
    /// A numeric value, possibly with K/M/G suffix.
    Number(String),
    /// `# ...` or `/* ... */`
    Comment(String),
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

#[derive(Debug, Clone)]
pub struct Span {
    pub token: Token,
    pub offset: usize,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn next_token(&mut self) -> Result<Option<Span>> {
        self.eat_while(char::is_whitespace);
        let offset = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            ';' | ',' | '(' | ')' | '{' | '}' | '[' | ']' => {
                self.bump();
                match c {
                    ';' => Token::Semicolon,
                    ',' => Token::Comma,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    _ => Token::RBracket,
                }
            }
            '#' => {
                self.bump();
                Token::Comment(self.eat_while(|c| c != '\n').trim().to_string())
            }
            '/' if self.rest().starts_with("/*") => {
                let Some(end) = self.rest()[2..].find("*/") else {
                    return Err(Error::check(offset, "unterminated block comment"));
                };
                let text = self.rest()[2..2 + end].trim().to_string();
                self.pos += end + 4;
                Token::Comment(text)
            }
            '"' => {
                self.bump();
                Token::QuotedString(self.quoted(offset)?)
            }
            't' | 'T' if self.rest().get(..5).is_some_and(|s| s.eq_ignore_ascii_case("text:")) => {
                self.pos += 5;
                Token::MultiLineString(self.multi_line(offset)?)
            }
            ':' => {
                self.bump();
                let name = self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                if name.is_empty() {
                    return Err(Error::check(offset, "empty tag"));
                }
                Token::Tag(format!(":{}", name.to_lowercase()))
            }
            '0'..='9' => {
                let digits = self.eat_while(|c| c.is_ascii_digit());
                let mut num = digits.to_string();
                if let Some(suffix) = self.peek().filter(|c| matches!(*c, 'K' | 'k' | 'M' | 'm' | 'G' | 'g')) {
                    self.bump();
                    num.push(suffix);
                }
                Token::Number(num)
            }
            c if c.is_ascii_alphabetic() || c == '_' => Token::Identifier(
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_')
                    .to_string(),
            ),
            other => {
                return Err(Error::check(offset, format!("unexpected character '{other}'")));
            }
        };

        Ok(Some(Span { token, offset }))
    }

    fn quoted(&mut self, offset: usize) -> Result<String> {
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => s.push(c),
                    None => break,
                },
                Some('"') => return Ok(s),
                Some(c) => s.push(c),
                None => break,
            }
        }
        Err(Error::check(offset, "unterminated string"))
    }

    /// Body of `text:` up to a line holding a single `.`; dot-stuffing undone.
    fn multi_line(&mut self, offset: usize) -> Result<String> {
        self.eat_while(|c| c != '\n');
        self.bump();

        let mut body = String::new();
        loop {
            if self.peek().is_none() {
                return Err(Error::check(offset, "unterminated multi-line string"));
            }
            let line = self.eat_while(|c| c != '\n');
            self.bump();
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line == "." {
                return Ok(body);
            }
            body.push_str(line.strip_prefix("..").map_or(line, |_| &line[1..]));
            body.push('\n');
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Span>> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut spans = Vec::new();
    while let Some(span) = lexer.next_token()? {
        spans.push(span);
    }
    Ok(spans)
}
