//! # 字面量解析器
//!
//! 递归下降解析单个选项值，产出可能含占位符的 [`OptionValue`]。
//!
//! 支持的语法:
//! - 对象: `{key: value, ...}`（允许尾随逗号）
//! - 数组: `[value, ...]`
//! - 字符串: `"..."`, `'...'`, `` `...` ``
//! - 数字: `1`, `-0.5`, `.5`, `1e3`
//! - 字面量: `true`, `false`, `null`, `undefined`
//! - 标识符: `name`, `card.offset`
//!   - 后跟 `(` → helper 调用（参数保留原文）
//!   - 根名存在于作用域 → 响应式引用
//!   - 其他 → 作为字符串
//!
//! 参考 JSON 的结构，但键不要求引号，标识符不要求引号。

use super::split::matching_close;
use crate::error::ParseError;
use crate::scope::EvalContext;
use crate::value::{OptionValue, PendingCall, ReactiveRef, Value, upsert_pair};

/// 解析一个完整的值，要求消费全部输入
///
/// `base_offset` 会加到错误偏移上，便于在整条表达式中定位。
pub fn parse_literal<C: EvalContext + ?Sized>(
    input: &str,
    base_offset: usize,
    ctx: &C,
) -> Result<OptionValue, ParseError> {
    let mut parser = LiteralParser::new(input, base_offset, ctx);
    parser.skip_whitespace();
    if parser.peek_char().is_none() {
        return Err(ParseError::EmptyEntry);
    }
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    match parser.peek_char() {
        None => Ok(value),
        Some(c) => Err(ParseError::UnexpectedChar {
            offset: parser.offset(),
            found: c,
        }),
    }
}

/// 解析对象键
///
/// 接受标识符、数字或带引号的字符串。
pub fn parse_key(text: &str) -> Result<String, ParseError> {
    let key = text.trim();
    let invalid = || ParseError::InvalidKey {
        key: key.to_string(),
    };

    match key.chars().next() {
        Some(q @ ('"' | '\'' | '`')) => {
            let mut parser = LiteralParser::new(key, 0, &NoScope);
            let s = parser.parse_string(q).map_err(|_| invalid())?;
            if parser.peek_char().is_some() {
                return Err(invalid());
            }
            Ok(s)
        }
        Some(_) if is_identifier(key) || is_plain_number(key) => Ok(key.to_string()),
        _ => Err(invalid()),
    }
}

/// 是否是有效标识符 `[A-Za-z_$][A-Za-z0-9_$]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn is_plain_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// 无变量的上下文，用于只需要语法的场景
struct NoScope;

impl EvalContext for NoScope {
    fn get_var(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// 字面量解析器
struct LiteralParser<'a, C: ?Sized> {
    input: &'a str,
    pos: usize,
    base_offset: usize,
    ctx: &'a C,
}

impl<'a, C: EvalContext + ?Sized> LiteralParser<'a, C> {
    fn new(input: &'a str, base_offset: usize, ctx: &'a C) -> Self {
        Self {
            input,
            pos: 0,
            base_offset,
            ctx,
        }
    }

    fn offset(&self) -> usize {
        self.base_offset + self.pos
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn unexpected_end(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedEnd {
            offset: self.offset(),
            expected,
        }
    }

    /// 消费期望的字符
    fn expect(&mut self, expected: char, what: &'static str) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek_char() {
            Some(c) if c == expected => {
                self.consume_char();
                Ok(())
            }
            Some(c) => Err(ParseError::UnexpectedChar {
                offset: self.offset(),
                found: c,
            }),
            None => Err(self.unexpected_end(what)),
        }
    }

    /// 解析任意值
    fn parse_value(&mut self) -> Result<OptionValue, ParseError> {
        self.skip_whitespace();
        let c = self.peek_char().ok_or_else(|| self.unexpected_end("值"))?;

        match c {
            '{' => self.parse_object(),
            '[' => self.parse_array(),
            '"' | '\'' | '`' => Ok(OptionValue::Literal(Value::String(self.parse_string(c)?))),
            '-' | '+' | '.' | '0'..='9' => Ok(OptionValue::Literal(Value::Number(
                self.parse_number()?,
            ))),
            c if is_ident_start(c) => self.parse_ident_ref(),
            _ => Err(ParseError::UnexpectedChar {
                offset: self.offset(),
                found: c,
            }),
        }
    }

    /// 解析对象字面量
    fn parse_object(&mut self) -> Result<OptionValue, ParseError> {
        self.consume_char(); // '{'
        let mut pairs = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('}') => {
                    self.consume_char();
                    return Ok(OptionValue::Object(pairs));
                }
                Some(_) => {}
                None => return Err(self.unexpected_end("'}'")),
            }

            let key = self.parse_object_key()?;
            self.expect(':', "':'")?;
            let value = self.parse_value()?;
            upsert_pair(&mut pairs, key, value);

            self.skip_whitespace();
            match self.peek_char() {
                Some(',') => {
                    self.consume_char();
                }
                Some('}') => {}
                Some(c @ (')' | ']')) => {
                    return Err(ParseError::UnbalancedDelimiter {
                        offset: self.offset(),
                        expected: '}',
                        found: c,
                    });
                }
                Some(c) => {
                    return Err(ParseError::UnexpectedChar {
                        offset: self.offset(),
                        found: c,
                    });
                }
                None => return Err(self.unexpected_end("'}'")),
            }
        }
    }

    fn parse_object_key(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        match self.peek_char() {
            Some(q @ ('"' | '\'' | '`')) => self.parse_string(q),
            Some(c) if is_ident_start(c) => Ok(self.parse_identifier()),
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek_char(), Some(d) if d.is_ascii_digit() || d == '.') {
                    self.consume_char();
                }
                Ok(self.input[start..self.pos].to_string())
            }
            Some(c) => Err(ParseError::UnexpectedChar {
                offset: self.offset(),
                found: c,
            }),
            None => Err(self.unexpected_end("键")),
        }
    }

    /// 解析数组字面量
    fn parse_array(&mut self) -> Result<OptionValue, ParseError> {
        self.consume_char(); // '['
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some(']') => {
                    self.consume_char();
                    return Ok(OptionValue::Array(items));
                }
                Some(_) => {}
                None => return Err(self.unexpected_end("']'")),
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek_char() {
                Some(',') => {
                    self.consume_char();
                }
                Some(']') => {}
                Some(c @ (')' | '}')) => {
                    return Err(ParseError::UnbalancedDelimiter {
                        offset: self.offset(),
                        expected: ']',
                        found: c,
                    });
                }
                Some(c) => {
                    return Err(ParseError::UnexpectedChar {
                        offset: self.offset(),
                        found: c,
                    });
                }
                None => return Err(self.unexpected_end("']'")),
            }
        }
    }

    /// 解析字符串字面量（支持常见转义）
    fn parse_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start_offset = self.offset();
        self.consume_char(); // 开始引号
        let mut s = String::new();

        while let Some(c) = self.consume_char() {
            if c == quote {
                return Ok(s);
            }
            if c == '\\' {
                match self.consume_char() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some(other) => s.push(other),
                    None => break,
                }
            } else {
                s.push(c);
            }
        }

        Err(ParseError::UnterminatedString {
            offset: start_offset,
            quote,
        })
    }

    /// 解析数字
    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        let start_offset = self.offset();

        if matches!(self.peek_char(), Some('-' | '+')) {
            self.consume_char();
        }
        self.consume_digits();
        if self.peek_char() == Some('.') {
            self.consume_char();
            self.consume_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.consume_char();
            if matches!(self.peek_char(), Some('-' | '+')) {
                self.consume_char();
            }
            self.consume_digits();
        }

        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ParseError::InvalidNumber {
                offset: start_offset,
                text: text.to_string(),
            })
    }

    fn consume_digits(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.consume_char();
        }
    }

    fn parse_identifier(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if is_ident_continue(c)) {
            self.consume_char();
        }
        self.input[start..self.pos].to_string()
    }

    /// 解析标识符引用：字面量关键字、helper 调用、响应式引用或裸字符串
    fn parse_ident_ref(&mut self) -> Result<OptionValue, ParseError> {
        let mut path = self.parse_identifier();

        match path.as_str() {
            "true" => return Ok(OptionValue::Literal(Value::Bool(true))),
            "false" => return Ok(OptionValue::Literal(Value::Bool(false))),
            "null" => return Ok(OptionValue::Literal(Value::Null)),
            "undefined" => return Ok(OptionValue::Literal(Value::Undefined)),
            _ => {}
        }

        // 成员访问 a.b.c
        while self.peek_char() == Some('.')
            && self.remaining()[1..].starts_with(is_ident_start)
        {
            self.consume_char();
            path.push('.');
            path.push_str(&self.parse_identifier());
        }

        let before_paren = self.pos;
        self.skip_whitespace();
        if self.peek_char() == Some('(') {
            let open_offset = self.offset();
            let close = matching_close(self.input, self.pos).ok_or_else(|| {
                ParseError::UnexpectedEnd {
                    offset: open_offset,
                    expected: "')'",
                }
            })?;
            let found = self.input[close..].chars().next().unwrap_or(')');
            if found != ')' {
                return Err(ParseError::UnbalancedDelimiter {
                    offset: self.base_offset + close,
                    expected: ')',
                    found,
                });
            }
            let args = self.input[self.pos + 1..close].trim().to_string();
            self.pos = close + 1;
            return Ok(OptionValue::Call(PendingCall::new(path, args)));
        }
        self.pos = before_paren;

        let reference = ReactiveRef::new(path);
        if self.ctx.has_var(reference.root()) {
            Ok(OptionValue::Reactive(reference))
        } else {
            Ok(OptionValue::Literal(Value::String(reference.source)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{MapScope, ScopeChain};

    fn scope() -> ScopeChain {
        ScopeChain::single(MapScope::new().with("offset", 40.0).with("card", "c"))
    }

    fn parse(input: &str) -> Result<OptionValue, ParseError> {
        parse_literal(input, 0, &scope())
    }

    fn num(n: f64) -> OptionValue {
        OptionValue::Literal(Value::Number(n))
    }

    #[test]
    fn test_parse_primitives() {
        assert_eq!(parse("42").unwrap(), num(42.0));
        assert_eq!(parse("-0.5").unwrap(), num(-0.5));
        assert_eq!(parse(".5").unwrap(), num(0.5));
        assert_eq!(parse("1e3").unwrap(), num(1000.0));
        assert_eq!(
            parse("'hi'").unwrap(),
            OptionValue::Literal(Value::string("hi"))
        );
        assert_eq!(parse("true").unwrap(), OptionValue::Literal(Value::Bool(true)));
        assert_eq!(parse("null").unwrap(), OptionValue::Literal(Value::Null));
        assert_eq!(
            parse("undefined").unwrap(),
            OptionValue::Literal(Value::Undefined)
        );
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(
            parse(r#""a\"b\n""#).unwrap(),
            OptionValue::Literal(Value::string("a\"b\n"))
        );
    }

    #[test]
    fn test_bare_identifier_becomes_string() {
        assert_eq!(
            parse("easeInOut").unwrap(),
            OptionValue::Literal(Value::string("easeInOut"))
        );
    }

    #[test]
    fn test_scoped_identifier_becomes_reactive() {
        assert_eq!(
            parse("offset").unwrap(),
            OptionValue::Reactive(ReactiveRef::new("offset"))
        );
        assert_eq!(
            parse("card.offset.x").unwrap(),
            OptionValue::Reactive(ReactiveRef::new("card.offset.x"))
        );
    }

    #[test]
    fn test_call_keeps_raw_arguments() {
        assert_eq!(
            parse("spring()").unwrap(),
            OptionValue::Call(PendingCall::new("spring", ""))
        );
        assert_eq!(
            parse("stagger(0.1, {start: 'a,b'})").unwrap(),
            OptionValue::Call(PendingCall::new("stagger", "0.1, {start: 'a,b'}"))
        );
        // 作用域内同名变量后跟括号仍是调用
        assert_eq!(
            parse("offset(1)").unwrap(),
            OptionValue::Call(PendingCall::new("offset", "1"))
        );
    }

    #[test]
    fn test_parse_nested_containers() {
        let value = parse("{x: [0, 100], y: {to: offset}, z: spring(),}").unwrap();
        let OptionValue::Object(pairs) = value else {
            panic!("期望对象");
        };
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].1, OptionValue::Array(vec![num(0.0), num(100.0)]));
        assert_eq!(
            pairs[1].1,
            OptionValue::Object(vec![(
                "to".to_string(),
                OptionValue::Reactive(ReactiveRef::new("offset"))
            )])
        );
        assert!(matches!(pairs[2].1, OptionValue::Call(_)));
    }

    #[test]
    fn test_duplicate_object_key_replaces_in_place() {
        let value = parse("{a: 1, b: 2, a: 3}").unwrap();
        assert_eq!(
            value,
            OptionValue::Object(vec![("a".to_string(), num(3.0)), ("b".to_string(), num(2.0))])
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse("[1, 2"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("[1, 2}"),
            Err(ParseError::UnbalancedDelimiter {
                expected: ']',
                found: '}',
                ..
            })
        ));
        assert!(matches!(
            parse("'open"),
            Err(ParseError::UnterminatedString { quote: '\'', .. })
        ));
        assert!(matches!(parse("300ms"), Err(ParseError::UnexpectedChar { found: 'm', .. })));
        assert!(matches!(parse("-"), Err(ParseError::InvalidNumber { .. })));
        assert!(matches!(parse("   "), Err(ParseError::EmptyEntry)));
        assert!(matches!(parse("spring(1"), Err(ParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_error_offset_includes_base() {
        let err = parse_literal("[1 2]", 10, &scope()).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedChar {
                offset: 13,
                found: '2'
            }
        );
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key(" opacity ").unwrap(), "opacity");
        assert_eq!(parse_key("'background-color'").unwrap(), "background-color");
        assert_eq!(parse_key("0").unwrap(), "0");
        assert!(parse_key("a b").is_err());
        assert!(parse_key("").is_err());
        assert!(parse_key("'x' y").is_err());
    }
}
