//! Pulls a structured payload out of a free-text model reply.
//!
//! Replies may wrap the payload in a fenced code block, surround it with
//! prose, use single quotes, capitalized `True`/`None`, or leave trailing
//! commas. Strict JSON is tried first; the permissive literal reader below
//! handles the rest.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::error::ExtractError;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Returns the contents of the first fenced code block, or the trimmed text
/// when there is none. Applying it twice yields the same string.
pub fn strip_code_fence(text: &str) -> &str {
    match FENCE.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Narrows a reply to the span between the first opening bracket and the
/// last matching closing bracket, after fence stripping.
pub fn payload_span(text: &str) -> Option<&str> {
    let stripped = strip_code_fence(text);
    let open = stripped.find(['{', '['])?;
    let closer = if stripped[open..].starts_with('{') { '}' } else { ']' };
    let close = stripped.rfind(closer)?;
    (close > open).then(|| &stripped[open..=close])
}

/// Parses the embedded payload as a JSON value, falling back to the
/// permissive literal reader.
pub fn parse_value(text: &str) -> Result<Value, ExtractError> {
    let payload = payload_span(text).ok_or(ExtractError::NoPayload)?;
    match serde_json::from_str(payload) {
        Ok(value) => Ok(value),
        Err(strict) => parse_literal(payload).map_err(|_| ExtractError::Json {
            source: strict,
            payload: payload.to_string(),
        }),
    }
}

/// Parses the embedded payload into `T`.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let value = parse_value(text)?;
    let rendered = value.to_string();
    serde_json::from_value(value).map_err(|source| ExtractError::Json {
        source,
        payload: rendered,
    })
}

/// Reads a JSON-like literal: single or double quoted strings, trailing
/// commas, tuples as arrays, `True`/`False`/`None`.
pub fn parse_literal(text: &str) -> Result<Value, ExtractError> {
    let mut reader = LiteralReader {
        chars: text.char_indices().collect(),
        pos: 0,
    };
    let value = reader.value()?;
    reader.skip_ws();
    if reader.pos < reader.chars.len() {
        return Err(reader.error("trailing characters"));
    }
    Ok(value)
}

struct LiteralReader {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl LiteralReader {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or_else(|| self.chars.last().map(|(i, c)| i + c.len_utf8()).unwrap_or(0))
    }

    fn error(&self, reason: &str) -> ExtractError {
        ExtractError::Literal {
            offset: self.offset(),
            reason: reason.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Result<Value, ExtractError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.sequence(']'),
            Some('(') => self.sequence(')'),
            Some(q @ ('"' | '\'')) => self.string(q).map(Value::String),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() => self.word(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self) -> Result<Value, ExtractError> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(q @ ('"' | '\'')) => {
                    let key = self.string(q)?;
                    self.skip_ws();
                    if self.peek() != Some(':') {
                        return Err(self.error("expected ':'"));
                    }
                    self.pos += 1;
                    let value = self.value()?;
                    map.insert(key, value);
                }
                Some(c) if c.is_alphabetic() || c == '_' => {
                    let key = self.bare_word();
                    self.skip_ws();
                    if self.peek() != Some(':') {
                        return Err(self.error("expected ':'"));
                    }
                    self.pos += 1;
                    let value = self.value()?;
                    map.insert(key, value);
                }
                _ => return Err(self.error("expected key or '}'")),
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn sequence(&mut self, close: char) -> Result<Value, ExtractError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => return Err(self.error("expected ',' or closing bracket")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, ExtractError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let escaped = self.peek().ok_or_else(|| self.error("unterminated escape"))?;
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'u' => out.push(self.unicode_escape()?),
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, ExtractError> {
        let digits: String = (0..4).filter_map(|_| {
            let c = self.peek()?;
            self.pos += 1;
            Some(c)
        })
        .collect();
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn number(&mut self) -> Result<Value, ExtractError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();
        let literal = literal.trim_start_matches('+');
        if let Ok(int) = literal.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error("invalid number"))
    }

    fn bare_word(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().map(|(_, c)| *c).collect()
    }

    fn word(&mut self) -> Result<Value, ExtractError> {
        let start = self.pos;
        let word = self.bare_word();
        match word.as_str() {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            "null" | "None" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.error("unquoted word"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn strips_json_fence() {
        let reply = "Sure!\n```json\n{\"date\": \"2023/1/3\"}\n```\nAnything else?";
        assert_eq!(strip_code_fence(reply), "{\"date\": \"2023/1/3\"}");
    }

    #[test]
    fn strips_bare_fence() {
        let reply = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fence(reply), "[1, 2]");
    }

    #[test]
    fn stripping_is_idempotent() {
        let replies = [
            "```json\n{\"a\": 1}\n```",
            "{\"a\": 1}",
            "  plain words  ",
            "before ```json {\"a\": 1}``` after",
        ];
        for reply in replies {
            let once = strip_code_fence(reply);
            assert_eq!(strip_code_fence(once), once, "reply: {reply}");
        }
    }

    #[test]
    fn payload_span_drops_surrounding_prose() {
        let reply = "Here you go: {\"a\": {\"b\": 2}} hope that helps";
        assert_eq!(payload_span(reply), Some("{\"a\": {\"b\": 2}}"));
        assert_eq!(payload_span("no structure here"), None);
    }

    #[test]
    fn reads_capitalized_literals() {
        let value = parse_literal("{'date': '2023/11/21', 'done': True, 'note': None, 'items': (1, 2.5,),}").unwrap();
        assert_eq!(
            value,
            json!({"date": "2023/11/21", "done": true, "note": null, "items": [1, 2.5]})
        );
    }

    #[test]
    fn keeps_apostrophes_inside_double_quotes() {
        let value = parse_literal(r#"{"summary": "Mike's birthday", 'k': 'it\'s'}"#).unwrap();
        assert_eq!(value["summary"], "Mike's birthday");
        assert_eq!(value["k"], "it's");
    }

    #[test]
    fn reports_offset_of_bad_literal() {
        let err = parse_literal("{'a': tomorrow}").unwrap_err();
        assert!(matches!(err, ExtractError::Literal { offset: 6, .. }));
    }

    #[test]
    fn parse_payload_tolerates_trailing_commas() {
        #[derive(Deserialize)]
        struct Times {
            start: String,
        }
        let reply = "```json\n{\n  \"start\": \"2023-11-28T09:00:00\",\n}\n```";
        let times: Times = parse_payload(reply).unwrap();
        assert_eq!(times.start, "2023-11-28T09:00:00");
    }

    #[test]
    fn parse_value_without_payload_fails() {
        assert!(matches!(parse_value("tomorrow, 2023/1/3, 2023/1/4"), Err(ExtractError::NoPayload)));
    }
}
