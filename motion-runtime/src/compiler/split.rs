//! # 顶层切分
//!
//! 带引号状态与括号深度的扫描器，用于：
//!
//! - 在顶层逗号处切分条目（忽略 `()` / `[]` / `{}` 内部以及字符串内的逗号）
//! - 查找条目中第一个顶层冒号
//! - 查找与开括号匹配的闭括号
//!
//! 扫描器本身是宽松的：不配对的闭括号只会把深度减到 0，不会报错。
//! 精确的语法错误由字面量解析器在单个条目范围内报告，
//! 这样一个坏条目不会拖累其他条目。

/// 切分出的片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// 片段文本（未去除空白）
    pub text: &'a str,
    /// 片段在原文中的起始字节偏移
    pub offset: usize,
}

impl<'a> Segment<'a> {
    /// 是否只含空白
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// 扫描状态
#[derive(Debug, Default)]
struct Scanner {
    quote: Option<char>,
    escaped: bool,
    depth: usize,
}

impl Scanner {
    /// 处理一个字符，返回该字符是否位于顶层且不在字符串内
    fn step(&mut self, c: char) -> bool {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            return false;
        }

        match c {
            '"' | '\'' | '`' => {
                self.quote = Some(c);
                false
            }
            '(' | '[' | '{' => {
                let top = self.depth == 0;
                self.depth += 1;
                top
            }
            ')' | ']' | '}' => {
                self.depth = self.depth.saturating_sub(1);
                self.depth == 0
            }
            _ => self.depth == 0,
        }
    }
}

/// 在顶层 `separator` 处切分
pub fn split_top_level(text: &str, separator: char) -> Vec<Segment<'_>> {
    let mut scanner = Scanner::default();
    let mut segments = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        let top = scanner.step(c);
        if top && c == separator {
            segments.push(Segment {
                text: &text[start..i],
                offset: start,
            });
            start = i + c.len_utf8();
        }
    }

    segments.push(Segment {
        text: &text[start..],
        offset: start,
    });
    segments
}

/// 查找第一个顶层 `needle` 的字节位置
pub fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut scanner = Scanner::default();
    text.char_indices()
        .find(|&(_, c)| scanner.step(c) && c == needle)
        .map(|(i, _)| i)
}

/// 查找与 `open_index` 处开括号匹配的闭括号位置
///
/// 只统计深度，不校验括号种类；种类由字面量解析器校验。
pub fn matching_close(text: &str, open_index: usize) -> Option<usize> {
    let mut scanner = Scanner::default();
    let mut entered = false;

    for (i, c) in text[open_index..].char_indices() {
        let was_quoted = scanner.quote.is_some();
        scanner.step(c);
        if was_quoted {
            continue;
        }
        match c {
            '(' | '[' | '{' => entered = true,
            ')' | ']' | '}' if entered && scanner.depth == 0 => return Some(open_index + i),
            _ => {}
        }
    }

    None
}

/// 整段文本是否被一个最外层对象字面量包裹
pub fn is_wrapped_object(text: &str) -> bool {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return false;
    }
    matching_close(trimmed, 0) == Some(trimmed.len() - 1)
}

/// 去掉最外层的一对括号，返回内部文本及其相对 `text` 的偏移
///
/// 调用方需先用 [`is_wrapped_object`] 确认。
pub fn unwrap_braces(text: &str) -> Segment<'_> {
    let leading = text.len() - text.trim_start().len();
    let trimmed = text.trim();
    Segment {
        text: &trimmed[1..trimmed.len() - 1],
        offset: leading + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments.iter().map(|s| s.text.trim()).collect()
    }

    #[test]
    fn test_split_respects_nesting() {
        let body = "opacity: [0,1], x: spring(10,200)";
        let segments = split_top_level(body, ',');
        assert_eq!(texts(&segments), vec!["opacity: [0,1]", "x: spring(10,200)"]);
        assert_eq!(segments[1].offset, 15);
    }

    #[test]
    fn test_split_ignores_commas_in_strings() {
        let body = r#"easing: "a,b", x: stagger('0,1'), y: `c,d`"#;
        let segments = split_top_level(body, ',');
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].text.trim(), "x: stagger('0,1')");
    }

    #[test]
    fn test_split_handles_escaped_quotes() {
        let body = r#"a: "x\",y", b: 1"#;
        let segments = split_top_level(body, ',');
        assert_eq!(texts(&segments), vec![r#"a: "x\",y""#, "b: 1"]);
    }

    #[test]
    fn test_split_nested_objects() {
        let body = "x: {a: 1, b: [2, {c: 3}]}, y: 4";
        assert_eq!(
            texts(&split_top_level(body, ',')),
            vec!["x: {a: 1, b: [2, {c: 3}]}", "y: 4"]
        );
    }

    #[test]
    fn test_split_trailing_comma_yields_blank_segment() {
        let segments = split_top_level("x: 1,", ',');
        assert_eq!(segments.len(), 2);
        assert!(segments[1].is_blank());
    }

    #[test]
    fn test_find_top_level_colon() {
        assert_eq!(find_top_level("x: spring(a: 1)", ':'), Some(1));
        assert_eq!(find_top_level(r#""a:b": 1"#, ':'), Some(5));
        assert_eq!(find_top_level("{a: 1}", ':'), None);
    }

    #[test]
    fn test_matching_close() {
        let text = "spring(1, (2), ')') + 1";
        assert_eq!(matching_close(text, 6), Some(18));
        assert_eq!(matching_close("(unclosed", 0), None);
    }

    #[test]
    fn test_is_wrapped_object() {
        assert!(is_wrapped_object("{opacity: [0,1], x: spring()}"));
        assert!(is_wrapped_object("  { x: 1 }  "));
        assert!(!is_wrapped_object("a: {x: 1}, b: {y: 2}"));
        assert!(!is_wrapped_object("{x: 1}, {y: 2}"));
        assert!(!is_wrapped_object("{x: 1"));
    }

    #[test]
    fn test_unwrap_braces() {
        let inner = unwrap_braces("  {x: 1} ");
        assert_eq!(inner.text, "x: 1");
        assert_eq!(inner.offset, 3);
    }
}
