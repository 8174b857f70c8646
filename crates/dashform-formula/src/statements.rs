//! Statement converters: IF / AND / OR calls and Excel operators rewritten
//! into the row-mode script dialect.
//!
//! Each converter is a pure `&str -> String` function. IF, AND and OR loop
//! over the leftmost remaining call of their keyword; an occurrence they cannot
//! convert (wrong arity, unmatched parenthesis) stops that converter and the
//! rest of the text is left as-is.

use crate::splitter::{find_matching_paren, split_arguments};

/// Locate the leftmost `keyword(` call outside quoted literals.
///
/// The keyword matches case-insensitively and only as a whole word, so the
/// `IF(` inside `COUNTIF(` is not a hit. Returns the byte offset of the
/// keyword and of its opening parenthesis.
fn find_call(text: &str, keyword: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        if b == b'"' || b == b'\'' {
            quote = Some(b);
            continue;
        }

        let end = i + keyword.len();
        if end < bytes.len()
            && bytes[end] == b'('
            && text.is_char_boundary(i)
            && text[i..end].eq_ignore_ascii_case(keyword)
            && (i == 0 || !is_identifier_byte(bytes[i - 1]))
        {
            return Some((i, end));
        }
    }

    None
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Extract the leftmost `keyword(...)` call: `(start, end_inclusive, args)`
fn next_call(text: &str, keyword: &str) -> Option<(usize, usize, Vec<String>)> {
    let (start, open) = find_call(text, keyword)?;
    let close = find_matching_paren(text, open)?;
    let args = split_arguments(&text[open + 1..close]);
    Some((start, close, args))
}

/// Convert `IF(cond, then, else)` into `(then if cond else else)`.
///
/// The leftmost IF is converted first; IFs nested in its arguments are picked
/// up by later iterations. Stops at the first IF that does not have exactly
/// three arguments.
pub fn convert_if(formula: &str) -> String {
    let mut text = formula.to_string();

    while let Some((start, close, args)) = next_call(&text, "IF") {
        if args.len() != 3 {
            log::debug!("IF with {} arguments left unconverted", args.len());
            break;
        }
        let replacement = format!(
            "({} if {} else {})",
            args[1].trim(),
            args[0].trim(),
            args[2].trim()
        );
        text.replace_range(start..=close, &replacement);
    }

    text
}

fn convert_logical(formula: &str, keyword: &str, operator: &str) -> String {
    let mut text = formula.to_string();

    while let Some((start, close, args)) = next_call(&text, keyword) {
        if args.len() < 2 {
            log::debug!("{} with {} arguments left unconverted", keyword, args.len());
            break;
        }
        let joined = args
            .iter()
            .map(|a| a.trim())
            .collect::<Vec<_>>()
            .join(operator);
        text.replace_range(start..=close, &format!("({})", joined));
    }

    text
}

/// Convert `AND(a, b, ...)` into `(a and b and ...)`; needs at least two arguments
pub fn convert_and(formula: &str) -> String {
    convert_logical(formula, "AND", " and ")
}

/// Convert `OR(a, b, ...)` into `(a or b or ...)`; needs at least two arguments
pub fn convert_or(formula: &str) -> String {
    convert_logical(formula, "OR", " or ")
}

/// Rewrite Excel operators outside quoted literals.
///
/// - `<>` becomes `!=`
/// - a lone `=` becomes `==` (`==`, `!=`, `<=`, `>=` are left alone)
/// - `&` becomes ` + ` when its left side is a word, `)` or a closing quote
///   and its right side is a word, `(` or an opening quote; anything else is
///   left as-is
pub fn convert_operators(formula: &str) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '<' if chars.get(i + 1) == Some(&'>') => {
                out.push_str("!=");
                i += 1;
            }
            '=' => {
                let prev = if i > 0 { Some(chars[i - 1]) } else { None };
                let next = chars.get(i + 1).copied();
                let joined = matches!(prev, Some('=' | '!' | '<' | '>')) || next == Some('=');
                out.push_str(if joined { "=" } else { "==" });
            }
            '&' if concat_operands(&chars, i) => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                out.push_str(" + ");
                i += 1;
                while chars.get(i).map_or(false, |c| c.is_whitespace()) {
                    i += 1;
                }
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

fn concat_operands(chars: &[char], amp: usize) -> bool {
    if chars.get(amp + 1) == Some(&'&') || (amp > 0 && chars[amp - 1] == '&') {
        return false;
    }

    let left = chars[..amp].iter().rev().find(|c| !c.is_whitespace());
    let right = chars[amp + 1..].iter().find(|c| !c.is_whitespace());

    let left_ok = matches!(left, Some(c) if is_word_char(*c) || matches!(c, ')' | '"' | '\''));
    let right_ok = matches!(right, Some(c) if is_word_char(*c) || matches!(c, '(' | '"' | '\''));
    left_ok && right_ok
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The row-mode statement pipeline: IF, then AND, then OR, then operators.
///
/// IF runs first so that AND/OR inside its arguments are still in call form
/// when the arguments are split; operators run last so the emitted ternaries
/// are not disturbed.
pub fn convert_statements(formula: &str) -> String {
    let text = convert_if(formula);
    let text = convert_and(&text);
    let text = convert_or(&text);
    convert_operators(&text)
}
