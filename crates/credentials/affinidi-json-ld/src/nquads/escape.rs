/// Escapes a literal lexical form for N-Quads output.
///
/// Quotes, backslashes and the ASCII control characters are escaped; the
/// common ones use their short form (`\t`, `\n`...) and the rest `\uXXXX`.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c < '\u{0020}' || c == '\u{007F}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_literal`], also accepting `\uXXXX` surrogate pairs and `\UXXXXXXXX`.
pub fn unescape_literal(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let high = read_hex(&mut chars, 4)?;
                if (0xD800..=0xDBFF).contains(&high) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(format!("unpaired surrogate \\u{high:04X}"));
                    }
                    let low = read_hex(&mut chars, 4)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(format!("invalid low surrogate \\u{low:04X}"));
                    }
                    out.push(to_char(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))?);
                } else {
                    out.push(to_char(high)?);
                }
            }
            Some('U') => {
                let cp = read_hex(&mut chars, 8)?;
                out.push(to_char(cp)?);
            }
            Some(other) => return Err(format!("unknown escape sequence \\{other}")),
            None => return Err("trailing backslash".to_string()),
        }
    }
    Ok(out)
}

fn read_hex(chars: &mut std::str::Chars<'_>, len: usize) -> Result<u32, String> {
    let hex: String = chars.by_ref().take(len).collect();
    if hex.len() != len {
        return Err(format!("incomplete escape sequence '{hex}'"));
    }
    u32::from_str_radix(&hex, 16).map_err(|_| format!("invalid hex digits '{hex}'"))
}

fn to_char(cp: u32) -> Result<char, String> {
    char::from_u32(cp).ok_or_else(|| format!("invalid code point U+{cp:X}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(
            escape_literal("a\tb\n\"c\"\\d"),
            "a\\tb\\n\\\"c\\\"\\\\d"
        );
        assert_eq!(escape_literal("\u{0008}\u{000C}"), "\\b\\f");
        assert_eq!(escape_literal("\u{0001}\u{007F}"), "\\u0001\\u007F");
        assert_eq!(escape_literal("café 😀"), "café 😀");
    }

    #[test]
    fn unescapes_unicode_forms() {
        assert_eq!(unescape_literal("\\u00E9").unwrap(), "é");
        assert_eq!(unescape_literal("\\U0001F600").unwrap(), "\u{1F600}");
        assert_eq!(unescape_literal("\\uD83D\\uDE00").unwrap(), "\u{1F600}");
        assert_eq!(unescape_literal("x\\by\\f").unwrap(), "x\u{0008}y\u{000C}");
    }

    #[test]
    fn rejects_bad_escapes() {
        assert!(unescape_literal("test\\").is_err());
        assert!(unescape_literal("\\x").is_err());
        assert!(unescape_literal("\\u12").is_err());
        assert!(unescape_literal("\\uD83D").is_err());
    }
}
