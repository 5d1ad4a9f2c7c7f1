// src/parser.rs
use crate::errors::{QueryError, Result};
use crate::serializer::is_reserved;

/// Character cursor over query text. Positions are byte offsets.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn position(&self) -> usize {
        self.i
    }

    /// `[A-Za-z_][A-Za-z0-9_.]*`
    pub fn parse_selector(&mut self) -> Result<&'a str> {
        let start = self.i;
        match self.peek_char() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.i += 1,
            _ => return Err(QueryError::parse(start, "property name")),
        }
        while let Some(c) = self.peek_char() {
            if c == '_' || c == '.' || c.is_ascii_alphanumeric() {
                self.i += 1;
            } else {
                break;
            }
        }
        Ok(&self.s[start..self.i])
    }

    /// One of `==`, `!=`, `<`, `<=`, `>`, `>=` or `=name=`.
    pub fn parse_operator(&mut self) -> Result<&'a str> {
        let start = self.i;
        for fixed in ["==", "!=", "<=", ">=", "<", ">"] {
            if self.peek_str(fixed) {
                self.i += fixed.len();
                return Ok(fixed);
            }
        }
        if self.consume_char('=') {
            while let Some(c) = self.peek_char() {
                if c.is_ascii_lowercase() {
                    self.i += 1;
                } else {
                    break;
                }
            }
            if self.i > start + 1 && self.consume_char('=') {
                return Ok(&self.s[start..self.i]);
            }
        }
        self.i = start;
        Err(QueryError::parse(start, "comparison operator"))
    }

    /// A quoted string or a bare token, returned unescaped.
    pub fn parse_literal(&mut self) -> Result<String> {
        match self.peek_char() {
            Some('"') | Some('\'') => self.parse_quoted_string(),
            _ => self.parse_bare_token().map(str::to_string),
        }
    }

    pub fn parse_bare_token(&mut self) -> Result<&'a str> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if is_reserved(c) {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.i == start {
            return Err(QueryError::parse(start, "value"));
        }
        Ok(&self.s[start..self.i])
    }

    pub fn parse_quoted_string(&mut self) -> Result<String> {
        let start = self.i;
        let quote = match self.peek_char() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(QueryError::parse(start, "quoted string")),
        };
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    match nc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        other => out.push(other),
                    }
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        Err(QueryError::parse(self.i, format!("closing {quote}")))
    }

    pub fn expect(&mut self, c: char) -> Result<()> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(QueryError::parse(self.i, format!("'{c}'")))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_and_aliases() {
        for (text, op) in [
            ("==x", "=="),
            ("!=x", "!="),
            ("=gt=1", "=gt="),
            ("=like=a", "=like="),
            (">=1", ">="),
            ("<1", "<"),
        ] {
            assert_eq!(Parser::new(text).parse_operator().unwrap(), op);
        }
        let mut p = Parser::new("=1");
        assert_eq!(
            p.parse_operator().unwrap_err(),
            QueryError::Parse {
                position: 0,
                expected: "comparison operator".into()
            }
        );
        assert_eq!(p.position(), 0);
    }

    #[test]
    fn quoted_strings_unescape() {
        let mut p = Parser::new(r#""a \"b\" \\ c"rest"#);
        assert_eq!(p.parse_quoted_string().unwrap(), r#"a "b" \ c"#);
        assert!(p.peek_str("rest"));

        let mut single = Parser::new(r"'it\'s'");
        assert_eq!(single.parse_literal().unwrap(), "it's");

        assert!(matches!(
            Parser::new("'open").parse_quoted_string(),
            Err(QueryError::Parse { .. })
        ));
    }

    #[test]
    fn bare_tokens_stop_at_separators() {
        let mut p = Parser::new("Zürich;x");
        assert_eq!(p.parse_bare_token().unwrap(), "Zürich");
        assert_eq!(p.peek_char(), Some(';'));
        assert_eq!(p.position(), "Zürich".len());
    }

    #[test]
    fn selectors_allow_dots() {
        let mut p = Parser::new("address.city==x");
        assert_eq!(p.parse_selector().unwrap(), "address.city");
        assert!(Parser::new("1abc").parse_selector().is_err());
    }
}
