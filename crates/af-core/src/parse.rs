//! Number-list text grammar.
//!
//! Breakpoint and table data arrive as free text: numbers separated by
//! commas, whitespace, tabs or newlines, sometimes decorated with stray marker
//! characters (brackets, semicolons). `ParseText` walks such text one number
//! at a time. The first malformed token (run-on digits, a second decimal
//! point, a second exponent) ends the stream: every later request yields NaN
//! and `eof()` reports true, while numbers returned earlier stay valid.

use crate::{AfError, AfResult};

/// Incremental reader over a number-list string.
#[derive(Debug, Clone)]
pub struct ParseText<'a> {
    text: &'a str,
    pos: usize,
    eof: bool,
    malformed: Option<String>,
}

impl<'a> ParseText<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            eof: false,
            malformed: None,
        }
    }

    /// True once the text is exhausted or a malformed token was seen.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// The offending token, if parsing stopped on one.
    pub fn malformed(&self) -> Option<&str> {
        self.malformed.as_deref()
    }

    /// Next number in the list, or NaN at end of input.
    pub fn next_number(&mut self) -> f64 {
        while !self.eof {
            let Some((start, end)) = self.next_token() else {
                self.eof = true;
                break;
            };
            let token = &self.text[start..end];
            match classify(token) {
                Token::Stray => continue,
                Token::Number => match token.parse::<f64>() {
                    Ok(v) => return v,
                    Err(_) => self.stop_on(token),
                },
                Token::Malformed => self.stop_on(token),
            }
        }
        f64::NAN
    }

    /// Collect every number before end of input or the first malformed token.
    pub fn to_list(mut self) -> Vec<f64> {
        let mut out = Vec::new();
        loop {
            let v = self.next_number();
            if self.eof {
                return out;
            }
            out.push(v);
        }
    }

    /// Like [`to_list`](Self::to_list), but a malformed token is an error.
    pub fn try_to_list(mut self) -> AfResult<Vec<f64>> {
        let mut out = Vec::new();
        loop {
            let v = self.next_number();
            if let Some(text) = self.malformed.take() {
                return Err(AfError::MalformedNumber { text });
            }
            if self.eof {
                return Ok(out);
            }
            out.push(v);
        }
    }

    fn stop_on(&mut self, token: &str) {
        self.eof = true;
        self.malformed = Some(token.to_string());
    }

    /// Byte range of the next candidate token, skipping separators.
    fn next_token(&mut self) -> Option<(usize, usize)> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && !starts_number(bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < bytes.len() && continues_number(bytes[self.pos]) {
            self.pos += 1;
        }
        Some((start, self.pos))
    }
}

impl Iterator for ParseText<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let v = self.next_number();
        if self.eof { None } else { Some(v) }
    }
}

/// Parse text holding exactly one number (surrounding whitespace allowed).
pub fn parse_number(text: &str) -> AfResult<f64> {
    let trimmed = text.trim();
    match classify(trimmed) {
        Token::Number if trimmed.bytes().all(continues_number) => {
            trimmed.parse::<f64>().map_err(|_| AfError::MalformedNumber {
                text: text.to_string(),
            })
        }
        _ => Err(AfError::MalformedNumber {
            text: text.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Number,
    Malformed,
    /// Sign or dot with no digits: a marker between numbers.
    Stray,
}

fn starts_number(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.')
}

fn continues_number(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')
}

fn classify(token: &str) -> Token {
    let bytes = token.as_bytes();
    if !bytes.iter().any(u8::is_ascii_digit) {
        return if bytes.iter().any(|b| matches!(b, b'e' | b'E')) {
            Token::Malformed
        } else {
            Token::Stray
        };
    }

    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut mantissa_digits = 0;
    let mut seen_dot = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => mantissa_digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            b'e' | b'E' => break,
            _ => return Token::Malformed,
        }
        i += 1;
    }
    if mantissa_digits == 0 {
        return Token::Malformed;
    }
    if i == bytes.len() {
        return Token::Number;
    }

    // exponent part
    i += 1;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }
    let exp_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == exp_start || i != bytes.len() {
        return Token::Malformed;
    }
    Token::Number
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_separators() {
        let list = ParseText::new("1, 2\t3\n-4.5 ,6e2").to_list();
        assert_eq!(list, vec![1.0, 2.0, 3.0, -4.5, 600.0]);
    }

    #[test]
    fn stray_markers_are_skipped() {
        let list = ParseText::new("[ 1.0; 2.0 ] {3} - .").to_list();
        assert_eq!(list, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn double_decimal_stops_stream() {
        let mut p = ParseText::new("1.0 2.0.1 3.0");
        assert_eq!(p.next_number(), 1.0);
        assert!(!p.eof());
        assert!(p.next_number().is_nan());
        assert!(p.eof());
        assert_eq!(p.malformed(), Some("2.0.1"));
        assert!(p.next_number().is_nan());
    }

    #[test]
    fn double_exponent_is_malformed() {
        let list = ParseText::new("5, 1e3e4, 7").to_list();
        assert_eq!(list, vec![5.0]);
    }

    #[test]
    fn run_on_digits_are_malformed() {
        let err = ParseText::new("1 2-3").try_to_list().unwrap_err();
        assert_eq!(
            err,
            AfError::MalformedNumber {
                text: "2-3".to_string()
            }
        );
    }

    #[test]
    fn exponent_forms() {
        let list = ParseText::new("1E+2 2.5e-1 .5 7.").to_list();
        assert_eq!(list, vec![100.0, 0.25, 0.5, 7.0]);
    }

    #[test]
    fn empty_text_is_eof() {
        let mut p = ParseText::new("  , \n");
        assert!(p.next_number().is_nan());
        assert!(p.eof());
        assert!(p.malformed().is_none());
    }

    #[test]
    fn iterator_yields_valid_prefix() {
        let v: Vec<f64> = ParseText::new("1 2 3..4 5").collect();
        assert_eq!(v, vec![1.0, 2.0]);
    }

    #[test]
    fn single_number_parsing() {
        assert_eq!(parse_number(" -3.45 ").unwrap(), -3.45);
        assert_eq!(parse_number("2e3").unwrap(), 2000.0);
        assert!(parse_number("1.2.3").is_err());
        assert!(parse_number("abc").is_err());
        assert!(parse_number("1 2").is_err());
        assert!(parse_number("").is_err());
    }
}
