//! Quote- and paren-aware scanning helpers.
//!
//! Formula text mixes code with quoted string literals (single or double
//! quoted, backslash escapes allowed). Everything here treats the inside of a
//! literal as opaque: its commas never split, its parentheses never nest, and
//! rewrites never touch it.

/// Split a comma-separated argument list at nesting depth 0.
///
/// The input is the inside of a call with the outer parentheses already
/// removed. Whitespace around each argument is preserved. An unterminated
/// quote swallows the rest of the input into the current argument; unbalanced
/// parentheses give a best-effort split.
///
/// ```rust
/// use dashform_formula::split_arguments;
///
/// assert_eq!(split_arguments(r#"a,"b,c",d"#), vec!["a", r#""b,c""#, "d"]);
/// assert_eq!(split_arguments("f(1,2),3"), vec!["f(1,2)", "3"]);
/// ```
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in args.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                result.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Byte index of the `)` matching the `(` at `open`, if there is one
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Apply `rewrite` to every unquoted stretch of `text`, copying quoted
/// literals (quotes included) through unchanged.
pub fn map_unquoted<F>(text: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut segment_start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                out.push_str(&text[segment_start..i + c.len_utf8()]);
                segment_start = i + c.len_utf8();
            }
            continue;
        }

        if c == '"' || c == '\'' {
            if segment_start < i {
                out.push_str(&rewrite(&text[segment_start..i]));
            }
            quote = Some(c);
            segment_start = i;
        }
    }

    if segment_start < text.len() {
        if quote.is_some() {
            out.push_str(&text[segment_start..]);
        } else {
            out.push_str(&rewrite(&text[segment_start..]));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(split_arguments("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_arguments("a, b"), vec!["a", " b"]);
        assert!(split_arguments("").is_empty());
    }

    #[test]
    fn test_split_respects_quotes() {
        assert_eq!(split_arguments(r#"a,"b,c",d"#), vec!["a", r#""b,c""#, "d"]);
        assert_eq!(split_arguments("'x,(y',z"), vec!["'x,(y'", "z"]);
        assert_eq!(split_arguments(r#""a\",b",c"#), vec![r#""a\",b""#, "c"]);
    }

    #[test]
    fn test_split_respects_parens() {
        assert_eq!(split_arguments("f(1,2),3"), vec!["f(1,2)", "3"]);
        assert_eq!(
            split_arguments("A>1,IF(B>2,\"x\",\"y\"),\"z\""),
            vec!["A>1", "IF(B>2,\"x\",\"y\")", "\"z\""]
        );
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert_eq!(split_arguments("a,\"b,c"), vec!["a", "\"b,c"]);
    }

    #[test]
    fn test_split_unbalanced_parens() {
        // Best effort: the unclosed paren keeps depth above zero
        assert_eq!(split_arguments("f(1,2,3"), vec!["f(1,2,3"]);
    }

    #[test]
    fn test_find_matching_paren() {
        let text = "IF(A>1,(B),\")\")+1";
        assert_eq!(find_matching_paren(text, 2), Some(14));
        assert_eq!(find_matching_paren("f((x)", 1), None);
    }

    #[test]
    fn test_map_unquoted() {
        let out = map_unquoted(r#"a + "a" + 'a' + a"#, |s| s.replace('a', "b"));
        assert_eq!(out, r#"b + "a" + 'a' + b"#);

        let out = map_unquoted(r#"x "unterminated a"#, |s| s.to_uppercase());
        assert_eq!(out, r#"X "unterminated a"#);
    }

    proptest! {
        #[test]
        fn prop_split_recovers_plain_arguments(
            args in proptest::collection::vec("[a-z0-9 ]{1,8}", 1..6)
        ) {
            prop_assert_eq!(split_arguments(&args.join(",")), args);
        }

        #[test]
        fn prop_quoted_commas_never_split(inner in "[a-z,]{0,10}") {
            let text = format!("\"{}\",x", inner);
            prop_assert_eq!(split_arguments(&text).len(), 2);
        }
    }
}
