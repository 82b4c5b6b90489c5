//! Type inference for values typed on the command line
//!
//! `cabinet put a b 2.5` stores the number 2.5, not the string "2.5". The
//! cascade, in order:
//!
//! 1. `null` becomes null
//! 2. numbers: strings holding `.`, `e` or `E` try float before integer,
//!    everything else tries integer before float
//! 3. `true` / `false`, case-insensitive
//! 4. a literal structure: quoted strings, lists, tuples, dicts, written
//!    Python-style (`['a', 1]`, `{'k': (1, 2)}`) or as JSON
//! 5. the raw string

use serde_json::{Map, Number, Value};

/// Infer a typed value from raw text
pub fn infer_value(raw: &str) -> Value {
    if raw == "null" {
        return Value::Null;
    }

    if let Some(number) = parse_number(raw) {
        return number;
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if let Some(literal) = parse_literal(raw) {
        return literal;
    }

    Value::String(raw.to_string())
}

fn parse_number(raw: &str) -> Option<Value> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let looks_float = text.contains(&['.', 'e', 'E'][..]);
    if looks_float {
        parse_float(text).or_else(|| parse_int(text))
    } else {
        parse_int(text).or_else(|| parse_float(text))
    }
}

fn parse_int(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    text.parse::<u64>().ok().map(|n| Value::Number(n.into()))
}

fn parse_float(text: &str) -> Option<Value> {
    // "inf" and "NaN" parse as f64 but have no JSON representation
    let starts_numeric = text
        .trim_start_matches(&['+', '-'][..])
        .starts_with(|c: char| c.is_ascii_digit() || c == '.');
    if !starts_numeric {
        return None;
    }
    let n = text.parse::<f64>().ok()?;
    Number::from_f64(n).map(Value::Number)
}

/// Parse a complete literal structure, or nothing
pub fn parse_literal(raw: &str) -> Option<Value> {
    let mut parser = LiteralParser::new(raw);
    let value = parser.value()?;
    parser.skip_ws();
    if parser.at_end() {
        Some(value)
    } else {
        None
    }
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '\'' | '"' => self.string().map(Value::String),
            '[' => {
                self.bump();
                self.sequence(']').map(Value::Array)
            }
            '(' => {
                self.bump();
                self.sequence(')').map(Value::Array)
            }
            '{' => {
                self.bump();
                self.braces()
            }
            c if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() => self.keyword(),
            _ => None,
        }
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\\' => {
                    let escaped = self.bump()?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '_')
        ) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        parse_number(&text)
    }

    fn keyword(&mut self) -> Option<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Some(Value::Bool(true)),
            "False" | "false" => Some(Value::Bool(false)),
            "None" | "null" => Some(Value::Null),
            _ => None,
        }
    }

    /// Items up to `close`; a trailing comma is allowed
    fn sequence(&mut self, close: char) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(items);
            }
            items.push(self.value()?);
            if self.eat(',') {
                continue;
            }
            return if self.eat(close) { Some(items) } else { None };
        }
    }

    /// `{}` is an empty dict, `{k: v}` a dict, `{a, b}` a set (kept as a list)
    fn braces(&mut self) -> Option<Value> {
        if self.eat('}') {
            return Some(Value::Object(Map::new()));
        }

        let first = self.value()?;
        if self.eat(':') {
            let mut map = Map::new();
            let value = self.value()?;
            map.insert(key_string(first)?, value);
            loop {
                if self.eat('}') {
                    return Some(Value::Object(map));
                }
                if !self.eat(',') {
                    return None;
                }
                if self.eat('}') {
                    return Some(Value::Object(map));
                }
                let key = self.value()?;
                if !self.eat(':') {
                    return None;
                }
                let value = self.value()?;
                map.insert(key_string(key)?, value);
            }
        }

        let mut items = vec![first];
        if self.eat('}') {
            return Some(Value::Array(items));
        }
        if !self.eat(',') {
            return None;
        }
        items.extend(self.sequence('}')?);
        Some(Value::Array(items))
    }
}

/// Object keys must be strings; scalars are rendered the way JSON encoders do
fn key_string(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
