//! Scanning the presentation format of DNS data.
//!
//! This is a small scanner for the zone file format of [RFC 1035],
//! section 5.1, good enough for trust anchor files and the record data
//! types known to this crate. It splits the input into entries, handling
//! comments, quoted strings and parentheses spanning several lines, and
//! then lets the record data types pick their tokens off an entry.
//!
//! Directives such as `$ORIGIN` and owner names left blank are not
//! supported.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use crate::base::name::{Name, NameError};
use data_encoding::{BASE32HEX_NOPAD, BASE64, HEXUPPER_PERMISSIVE};
use std::str::FromStr;
use std::{error, fmt};

//------------ Token ---------------------------------------------------------

/// A single token of an entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// The content of the token with quotes removed.
    content: String,

    /// Whether the token was a quoted string.
    quoted: bool,
}

impl Token {
    /// Returns the content of the token.
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Returns whether the token was quoted.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }
}

//------------ entries -------------------------------------------------------

/// Splits presentation format text into entries.
///
/// Each entry is the list of tokens of one record. Empty lines and lines
/// containing only comments produce no entry.
pub fn entries(text: &str) -> Result<Vec<Vec<Token>>, ScanError> {
    let mut res = Vec::new();
    let mut entry = Vec::new();
    let mut paren_depth = 0_usize;
    let mut chars = text.chars().peekable();
    let mut current: Option<String> = None;

    while let Some(ch) = chars.next() {
        match ch {
            ';' => {
                push_token(&mut entry, &mut current);
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
                if paren_depth == 0 && !entry.is_empty() {
                    res.push(std::mem::take(&mut entry));
                }
            }
            '\n' => {
                push_token(&mut entry, &mut current);
                if paren_depth == 0 && !entry.is_empty() {
                    res.push(std::mem::take(&mut entry));
                }
            }
            '(' => {
                push_token(&mut entry, &mut current);
                paren_depth += 1;
            }
            ')' => {
                push_token(&mut entry, &mut current);
                paren_depth = paren_depth
                    .checked_sub(1)
                    .ok_or(ScanError::new("unbalanced parentheses"))?;
            }
            '"' => {
                push_token(&mut entry, &mut current);
                let mut content = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch) => content.push(ch),
                            None => {
                                return Err(ScanError::new(
                                    "unterminated quoted string",
                                ))
                            }
                        },
                        Some(ch) => content.push(ch),
                        None => {
                            return Err(ScanError::new(
                                "unterminated quoted string",
                            ))
                        }
                    }
                }
                entry.push(Token {
                    content,
                    quoted: true,
                });
            }
            '\\' => {
                // Keep escapes intact for the name parser.
                let token = current.get_or_insert_with(String::new);
                token.push('\\');
                if let Some(next) = chars.next() {
                    token.push(next);
                }
            }
            ch if ch.is_whitespace() => {
                push_token(&mut entry, &mut current);
            }
            ch => current.get_or_insert_with(String::new).push(ch),
        }
    }
    push_token(&mut entry, &mut current);
    if paren_depth != 0 {
        return Err(ScanError::new("unbalanced parentheses"));
    }
    if !entry.is_empty() {
        res.push(entry);
    }
    Ok(res)
}

/// Moves the current token, if any, into the entry.
fn push_token(entry: &mut Vec<Token>, current: &mut Option<String>) {
    if let Some(content) = current.take() {
        entry.push(Token {
            content,
            quoted: false,
        });
    }
}

//------------ Scanner -------------------------------------------------------

/// A scanner over the tokens of a single entry.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    /// The tokens of the entry.
    tokens: &'a [Token],

    /// The index of the next token.
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner for an entry.
    pub fn new(tokens: &'a [Token]) -> Self {
        Scanner { tokens, pos: 0 }
    }

    /// Returns whether all tokens have been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Returns the next token without consuming it.
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<&'a Token, ScanError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or(ScanError::new("unexpected end of entry"))?;
        self.pos += 1;
        Ok(token)
    }

    /// Consumes and returns the next token as a string.
    pub fn scan_str(&mut self) -> Result<&'a str, ScanError> {
        self.next_token().map(Token::as_str)
    }

    /// Scans a value that implements `FromStr`.
    pub fn scan_parse<T: FromStr>(
        &mut self,
        what: &'static str,
    ) -> Result<T, ScanError> {
        self.scan_str()?
            .parse()
            .map_err(|_| ScanError::new(what))
    }

    /// Scans a domain name.
    pub fn scan_name(&mut self) -> Result<Name, ScanError> {
        Name::from_str(self.scan_str()?).map_err(Into::into)
    }

    /// Scans all remaining tokens as one base64 encoded value.
    pub fn scan_base64_rest(&mut self) -> Result<Vec<u8>, ScanError> {
        let text = self.concat_rest();
        BASE64
            .decode(text.as_bytes())
            .map_err(|_| ScanError::new("invalid base64 data"))
    }

    /// Scans all remaining tokens as one hex encoded value.
    pub fn scan_hex_rest(&mut self) -> Result<Vec<u8>, ScanError> {
        let text = self.concat_rest();
        HEXUPPER_PERMISSIVE
            .decode(text.as_bytes())
            .map_err(|_| ScanError::new("invalid hex data"))
    }

    /// Scans a single token as base32hex without padding.
    pub fn scan_base32hex(&mut self) -> Result<Vec<u8>, ScanError> {
        let text = self.scan_str()?.to_ascii_uppercase();
        BASE32HEX_NOPAD
            .decode(text.as_bytes())
            .map_err(|_| ScanError::new("invalid base32hex data"))
    }

    /// Concatenates all remaining tokens.
    fn concat_rest(&mut self) -> String {
        let mut res = String::new();
        while let Ok(token) = self.next_token() {
            res.push_str(token.as_str());
        }
        res
    }

    /// Returns an error if there are tokens left.
    pub fn finish(&self) -> Result<(), ScanError> {
        if self.is_exhausted() {
            Ok(())
        } else {
            Err(ScanError::new("trailing data"))
        }
    }
}

//------------ ScanError -----------------------------------------------------

/// An error happened while scanning presentation format data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanError(&'static str);

impl ScanError {
    /// Creates a new error with the given message.
    pub fn new(msg: &'static str) -> Self {
        ScanError(msg)
    }
}

impl From<NameError> for ScanError {
    fn from(_: NameError) -> Self {
        ScanError("invalid domain name")
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl error::Error for ScanError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    fn contents(entry: &[Token]) -> Vec<&str> {
        entry.iter().map(Token::as_str).collect()
    }

    #[test]
    fn comments_and_lines() {
        let res = entries(
            "; leading comment\n\
             example. 3600 IN A 192.0.2.1 ; trailing\n\
             \n\
             example. IN AAAA 2001:db8::1",
        )
        .unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(
            contents(&res[0]),
            vec!["example.", "3600", "IN", "A", "192.0.2.1"]
        );
        assert_eq!(contents(&res[1])[3], "2001:db8::1");
    }

    #[test]
    fn parentheses_span_lines() {
        let res = entries(
            "example. DNSKEY 257 3 8 (\n\
               AwEAAa ; first part\n\
               bcd= )\n",
        )
        .unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(
            contents(&res[0]),
            vec!["example.", "DNSKEY", "257", "3", "8", "AwEAAa", "bcd="]
        );
        assert!(entries("example. ( A").is_err());
        assert!(entries("example. ) A").is_err());
    }

    #[test]
    fn quoted_strings() {
        let res = entries("example. TXT \"hello world\" plain").unwrap();
        assert_eq!(res[0][2].as_str(), "hello world");
        assert!(res[0][2].is_quoted());
        assert!(!res[0][3].is_quoted());
    }

    #[test]
    fn scanner() {
        let res = entries("a.example. 300 abcd 0102 0a0B").unwrap();
        let mut scanner = Scanner::new(&res[0]);
        assert_eq!(
            scanner.scan_name().unwrap(),
            Name::from_str("a.example").unwrap()
        );
        assert_eq!(scanner.scan_parse::<u32>("ttl").unwrap(), 300);
        assert!(scanner.scan_parse::<u32>("number").is_err());
        assert_eq!(scanner.scan_hex_rest().unwrap(), vec![1, 2, 10, 11]);
        assert!(scanner.finish().is_ok());
    }
}
