//! # 修饰符链解析
//!
//! 把 `opacity.0.duration.300ms` 形式的修饰符列表解析为选项条目。
//!
//! - 修饰符按 `key, value, key, value, ...` 两两配对
//! - 末尾落单的 key 直接丢弃
//! - key 从 dash-case 转为字段名（`in-view` → `inView`）
//! - value 经过 [`normalize`] 做单位/数字转换

use crate::value::{Entry, OptionEntry, OptionValue, Value, upsert_entry};

/// 把 dash/snake 形式的 token 转为字段名
///
/// 只有紧跟小写字母的 `-` / `_` 才会被吞掉并把该字母转为大写。
pub fn to_field_name(token: &str) -> String {
    let mut result = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '-' || c == '_' {
            if let Some(next) = chars.peek().copied()
                && next.is_ascii_lowercase()
            {
                result.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        result.push(c);
    }

    result
}

/// 单个 token 的值规范化
///
/// - 缺失或空 token → `Undefined`
/// - 含 `_` 时把第一个 `_` 当作小数点（`1_5` → `1.5`）
/// - `duration` 接受 `<整数>ms`，换算为秒
/// - `rotate` 接受 `<整数>deg`，取整数角度
/// - 其他：能解析为数字则转为数字，否则原样保留字符串
pub fn normalize(field: &str, raw: Option<&str>) -> Value {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Value::Undefined;
    };

    if raw.contains('_') {
        return coerce_number(&raw.replacen('_', ".", 1));
    }

    match field {
        "duration" => {
            if let Some(ms) = parse_signed_int_with_suffix(raw, "ms") {
                return Value::Number(ms as f64 / 1000.0);
            }
        }
        "rotate" => {
            if let Some(deg) = parse_signed_int_with_suffix(raw, "deg") {
                return Value::Number(deg as f64);
            }
        }
        _ => {}
    }

    coerce_number(raw)
}

/// `[+-]?<digits><suffix>` 的完整匹配
fn parse_signed_int_with_suffix(raw: &str, suffix: &str) -> Option<i64> {
    let number = raw.strip_suffix(suffix)?;
    let digits = number.strip_prefix(['-', '+']).unwrap_or(number);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse::<i64>().ok()
}

/// 能完整解析为有限数字的 token 转为数字，否则保留字符串
fn coerce_number(token: &str) -> Value {
    let numeric_shape = token.bytes().any(|b| b.is_ascii_digit())
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));

    if numeric_shape
        && let Ok(n) = token.parse::<f64>()
        && n.is_finite()
    {
        return Value::Number(n);
    }

    Value::String(token.to_string())
}

/// 解析修饰符链
///
/// 奇数长度时末尾的单个 token 被丢弃。重复的 key 后者覆盖前者，位置保持首次出现处。
pub fn parse_modifiers<S: AsRef<str>>(tokens: &[S]) -> Vec<OptionEntry> {
    let mut entries = Vec::with_capacity(tokens.len() / 2);

    for pair in tokens.chunks_exact(2) {
        let field = to_field_name(pair[0].as_ref());
        let value = normalize(&field, Some(pair[1].as_ref()));
        upsert_entry(&mut entries, Entry::new(field, OptionValue::Literal(value)));
    }

    if tokens.len() % 2 == 1 {
        tracing::debug!(
            token = tokens[tokens.len() - 1].as_ref(),
            "修饰符链末尾的单个 token 被忽略"
        );
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(entries: &[OptionEntry], index: usize) -> &Value {
        match &entries[index].value {
            OptionValue::Literal(v) => v,
            other => panic!("期望字面量，实际 {other:?}"),
        }
    }

    #[test]
    fn test_to_field_name() {
        assert_eq!(to_field_name("opacity"), "opacity");
        assert_eq!(to_field_name("in-view"), "inView");
        assert_eq!(to_field_name("scroll-target"), "scrollTarget");
        assert_eq!(to_field_name("scroll_container"), "scrollContainer");
        assert_eq!(to_field_name("background-color"), "backgroundColor");
        // 数字/大写前的分隔符保留
        assert_eq!(to_field_name("x-1"), "x-1");
        assert_eq!(to_field_name("a-B"), "a-B");
        assert_eq!(to_field_name("trailing-"), "trailing-");
    }

    #[test]
    fn test_normalize_units() {
        assert_eq!(normalize("duration", Some("300ms")), Value::Number(0.3));
        assert_eq!(normalize("duration", Some("-300ms")), Value::Number(-0.3));
        assert_eq!(normalize("rotate", Some("-45deg")), Value::Number(-45.0));
        assert_eq!(normalize("rotate", Some("90deg")), Value::Number(90.0));
        assert_eq!(normalize("duration", Some("2")), Value::Number(2.0));
    }

    #[test]
    fn test_normalize_unknown_field_with_suffix_falls_through() {
        assert_eq!(normalize("x", Some("300ms")), Value::string("300ms"));
        assert_eq!(normalize("delay", Some("45deg")), Value::string("45deg"));
        // 单位不完整匹配时也不换算
        assert_eq!(normalize("duration", Some("3.5ms")), Value::string("3.5ms"));
    }

    #[test]
    fn test_normalize_underscore_decimal() {
        assert_eq!(normalize("x", Some("1_5")), Value::Number(1.5));
        assert_eq!(normalize("scale", Some("0_25")), Value::Number(0.25));
        assert_eq!(normalize("x", Some("a_b")), Value::string("a.b"));
    }

    #[test]
    fn test_normalize_generic() {
        assert_eq!(normalize("x", Some("abc")), Value::string("abc"));
        assert_eq!(normalize("x", Some("100")), Value::Number(100.0));
        assert_eq!(normalize("x", Some("-20")), Value::Number(-20.0));
        assert_eq!(normalize("x", Some("1e3")), Value::Number(1000.0));
        assert_eq!(normalize("easing", Some("ease-in")), Value::string("ease-in"));
        assert_eq!(normalize("x", Some("inf")), Value::string("inf"));
    }

    #[test]
    fn test_normalize_absent_value() {
        assert_eq!(normalize("x", None), Value::Undefined);
        assert_eq!(normalize("x", Some("")), Value::Undefined);
    }

    #[test]
    fn test_parse_modifiers_pairs_in_order() {
        let entries = parse_modifiers(&["opacity", "0", "duration", "300ms"]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].field, "opacity");
        assert_eq!(literal(&entries, 0), &Value::Number(0.0));
        assert_eq!(entries[1].field, "duration");
        assert_eq!(literal(&entries, 1), &Value::Number(0.3));
    }

    #[test]
    fn test_parse_modifiers_converts_keys() {
        let entries = parse_modifiers(&["background-color", "red", "rotate", "45deg"]);
        assert_eq!(entries[0].field, "backgroundColor");
        assert_eq!(literal(&entries, 0), &Value::string("red"));
        assert_eq!(literal(&entries, 1), &Value::Number(45.0));
    }

    #[test]
    fn test_parse_modifiers_drops_trailing_token() {
        let entries = parse_modifiers(&["opacity", "0", "dangling"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field, "opacity");

        let empty: Vec<OptionEntry> = parse_modifiers::<&str>(&[]);
        assert!(empty.is_empty());
        assert!(parse_modifiers(&["lonely"]).is_empty());
    }

    #[test]
    fn test_parse_modifiers_duplicate_key_last_wins() {
        let entries = parse_modifiers(&["x", "10", "y", "5", "x", "20"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].field, "x");
        assert_eq!(literal(&entries, 0), &Value::Number(20.0));
    }
}
