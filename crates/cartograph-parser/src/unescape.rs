//! String literal unescaping.
//!
//! Escapes are resolved in a single left-to-right pass, so the backslash
//! produced by `\\` is emitted as text and never starts another escape.

/// Strips one pair of surrounding double quotes (if present) and resolves
/// escape sequences.
///
/// Supported escapes: `\n`, `\r`, `\t`, `\b`, `\f`, `\\`, `\/`, `\'`, `\"`,
/// `\0`, `\u{XXXX}`, and a backslash followed by whitespace, which removes
/// the whitespace (for wrapping long strings across lines). Anything else,
/// including a trailing lone backslash, is kept verbatim.
///
/// ```
/// # use cartograph_parser::unescape_string;
/// assert_eq!(unescape_string(r#""line1\nline2""#), "line1\nline2");
/// assert_eq!(unescape_string(r#"\\\""#), r#"\""#);
/// ```
pub fn unescape_string(raw: &str) -> String {
    let body = strip_quotes(raw);
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(&next) = chars.peek() else {
            out.push('\\');
            break;
        };

        let simple = match next {
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            '\\' => Some('\\'),
            '/' => Some('/'),
            '\'' => Some('\''),
            '"' => Some('"'),
            '0' => Some('\0'),
            _ => None,
        };
        if let Some(resolved) = simple {
            chars.next();
            out.push(resolved);
            continue;
        }

        if next == 'u' {
            let mut lookahead = chars.clone();
            lookahead.next();
            if let Some(decoded) = unicode_escape(&mut lookahead) {
                chars = lookahead;
                out.push(decoded);
                continue;
            }
        }

        if next.is_whitespace() {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            continue;
        }

        // Unknown escape: keep the backslash, the next char is handled normally.
        out.push('\\');
    }

    out
}

fn strip_quotes(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Decodes `{XXXX}` (the part after `\u`), advancing `chars` past it.
fn unicode_escape(chars: &mut impl Iterator<Item = char>) -> Option<char> {
    if chars.next()? != '{' {
        return None;
    }
    let mut hex = String::new();
    let mut closed = false;
    for c in chars.by_ref() {
        if c == '}' {
            closed = true;
            break;
        }
        if !c.is_ascii_hexdigit() || hex.len() == 6 {
            return None;
        }
        hex.push(c);
    }
    if !closed || hex.is_empty() {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_newline_escape() {
        assert_eq!(unescape_string("\"line1\\nline2\""), "line1\nline2");
    }

    #[test]
    fn test_backslash_before_quote_is_not_double_processed() {
        // Input characters: \ \ \ "
        assert_eq!(unescape_string("\\\\\\\""), "\\\"");
    }

    #[test]
    fn test_escaped_backslash_followed_by_n() {
        // `\\n` is a backslash followed by the letter n, not a newline.
        assert_eq!(unescape_string("\"a\\\\nb\""), "a\\nb");
    }

    #[test]
    fn test_all_simple_escapes() {
        assert_eq!(
            unescape_string(r#""\t\r\b\f\/\'\"\0""#),
            "\t\r\u{08}\u{0C}/'\"\0"
        );
    }

    #[test]
    fn test_nested_escaped_quotes() {
        assert_eq!(
            unescape_string(r#""say \"hi \\\"there\\\"\"""#),
            r#"say "hi \"there\"""#
        );
    }

    #[test]
    fn test_unicode_escape() {
        assert_eq!(unescape_string(r#""\u{1F602}!""#), "\u{1F602}!");
        assert_eq!(unescape_string(r#""\u{41}""#), "A");
    }

    #[test]
    fn test_invalid_unicode_escape_is_verbatim() {
        assert_eq!(unescape_string(r#""\u{}""#), r#"\u{}"#);
        assert_eq!(unescape_string(r#""\u{D800}""#), r#"\u{D800}"#);
        assert_eq!(unescape_string(r#""\uZ""#), r#"\uZ"#);
    }

    #[test]
    fn test_escaped_whitespace_is_removed() {
        assert_eq!(unescape_string("\"before\\\n     after\""), "beforeafter");
    }

    #[test]
    fn test_unknown_escape_and_trailing_backslash() {
        assert_eq!(unescape_string(r#"\q"#), r#"\q"#);
        assert_eq!(unescape_string("abc\\"), "abc\\");
    }

    #[test]
    fn test_unquoted_input_is_not_stripped() {
        assert_eq!(unescape_string("plain"), "plain");
        assert_eq!(unescape_string("\""), "\"");
        assert_eq!(unescape_string("\"\""), "");
    }
}
