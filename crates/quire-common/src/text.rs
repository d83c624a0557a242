//! Small string helpers shared by the markup and stylesheet parsers.

/// Split `input` on ASCII whitespace, keeping quoted runs (`"` or `'`) and
/// bracketed/parenthesized groups intact.
///
/// `key="a b"` stays one token, as does `p[title~="x y"]` or `:not(a b)`.
/// Unbalanced quotes or brackets extend to the end of the input.
#[must_use]
pub fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (i, ch) in input.char_indices() {
        let in_quotes = quote.is_some();
        match ch {
            '"' | '\'' if quote.is_none_or(|q| q == ch) => {
                quote = if in_quotes { None } else { Some(ch) };
                let _ = start.get_or_insert(i);
            }
            '[' | '(' if !in_quotes => {
                depth += 1;
                let _ = start.get_or_insert(i);
            }
            ']' | ')' if !in_quotes => {
                depth = depth.saturating_sub(1);
                let _ = start.get_or_insert(i);
            }
            c if c.is_ascii_whitespace() && !in_quotes && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&input[s..i]);
                }
            }
            _ => {
                let _ = start.get_or_insert(i);
            }
        }
    }

    if let Some(s) = start {
        tokens.push(&input[s..]);
    }
    tokens
}

/// Strip one pair of matching surrounding quotes (`"` or `'`), if present.
#[must_use]
pub fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Count of leading indentation characters on a line.
#[must_use]
pub fn indentation(line: &str, indent_char: char) -> usize {
    line.chars().take_while(|&c| c == indent_char).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_whitespace() {
        assert_eq!(split_tokens("  a  b\tc "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_keeps_quoted_runs() {
        assert_eq!(
            split_tokens(r#"p class="a b" id=x"#),
            vec!["p", r#"class="a b""#, "id=x"]
        );
    }

    #[test]
    fn test_split_keeps_single_quoted_runs() {
        assert_eq!(
            split_tokens("p title='a b' alt=\"it's\""),
            vec!["p", "title='a b'", "alt=\"it's\""]
        );
    }

    #[test]
    fn test_split_keeps_brackets_and_parens() {
        assert_eq!(
            split_tokens(r#".a p[title~="x y"]:not(div span)"#),
            vec![".a", r#"p[title~="x y"]:not(div span)"#]
        );
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"en\""), "en");
        assert_eq!(unquote("'en'"), "en");
        assert_eq!(unquote("en"), "en");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_indentation() {
        assert_eq!(indentation("    <p>", ' '), 4);
        assert_eq!(indentation("<p>", ' '), 0);
    }
}
