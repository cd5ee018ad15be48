//! Pure, engine-agnostic lexical scanners.
//!
//! Every function here takes a `&str` view into a line of BASIC source
//! and returns a byte index (or a split of the input) without knowing
//! anything about variables, values, or the program store. The engine
//! crate drives these to find token boundaries before it interprets
//! what it found.

use crate::error::{ScanError, ScanResult};

/// Characters that end an operand token when seen outside brackets/quotes.
const OPERAND_TERMINATORS: &[char] = &[' ', '\t', '^', '*', '/', '+', '-', '=', '<', '>', '%'];

/// Find the index of the closing `"` that matches the leading `"` in `s`.
///
/// `s` must start with `"`. A `"` immediately preceded by `\` does not
/// close the string. Returns the index of the closing quote.
pub fn find_end_of_string(s: &str) -> ScanResult<usize> {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'"'));

    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'"' && bytes[i - 1] != b'\\' {
            return Ok(i);
        }
        i += 1;
    }
    Err(ScanError::UnterminatedString)
}

/// Find the index of the `)` that matches the leading `(` in `s`.
///
/// If `s` starts with `)` this is an empty bracket pair from the
/// caller's point of view and `0` is returned. Quoted sections are
/// skipped so a `)` inside a string literal is not mistaken for a
/// closing bracket.
pub fn find_end_of_bracket(s: &str) -> ScanResult<usize> {
    let bytes = s.as_bytes();
    if bytes.first() == Some(&b')') {
        return Ok(0);
    }
    debug_assert_eq!(bytes.first(), Some(&b'('));

    let mut depth: i32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += find_end_of_string(&s[i..])? + 1;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ScanError::MissingCloseBracket)
}

/// Find the index of the last character of the operand token starting
/// at `s[0]`, i.e. the position just before the first terminator seen
/// at bracket-depth zero (or the end of `s` if none is found).
///
/// A `"` at depth zero is a syntax error (quoted strings are handled
/// by the caller before reaching this scanner). A `)` at depth zero is
/// a syntax error (unmatched). Once a `(...)` group has closed, a
/// further `(` reopening depth is a syntax error — an operand may
/// contain at most one bracketed group, e.g. `FOO(1,2)`, never
/// `FOO(1)(2)`.
pub fn find_end_of_operand(s: &str) -> ScanResult<usize> {
    let bytes = s.as_bytes();
    let mut depth: i32 = 0;
    let mut closed_once = false;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if depth == 0 {
            if c == '"' {
                return Err(ScanError::QuoteInOperand);
            }
            if c == ')' {
                return Err(ScanError::UnmatchedCloseBracketInOperand);
            }
            if c == '(' {
                if closed_once {
                    return Err(ScanError::ReopenedBracketInOperand);
                }
                depth += 1;
                i += 1;
                continue;
            }
            if OPERAND_TERMINATORS.contains(&c) {
                return Ok(i.saturating_sub(1));
            }
            i += 1;
            continue;
        }

        // Inside brackets: skip quoted sections, track nesting.
        match c {
            '"' => {
                i += find_end_of_string(&s[i..])? + 1;
            }
            '(' => {
                depth += 1;
                i += 1;
            }
            ')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    closed_once = true;
                }
            }
            _ => i += 1,
        }
    }

    if bytes.is_empty() {
        Ok(0)
    } else {
        Ok(bytes.len() - 1)
    }
}

/// The result of splitting a string on the first occurrence of a
/// separator character: either the separator was absent (`One`), or
/// it split the string into a trimmed head and tail (`Two`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitTwo {
    One(String),
    Two(String, String),
}

/// Trim `s`, then split it at the first occurrence of `sep`.
pub fn split_in_two_on_char(s: &str, sep: char) -> SplitTwo {
    let trimmed = s.trim();
    match trimmed.find(sep) {
        Some(idx) => {
            let head = trimmed[..idx].trim().to_string();
            let tail = trimmed[idx + sep.len_utf8()..].trim().to_string();
            SplitTwo::Two(head, tail)
        }
        None => SplitTwo::One(trimmed.to_string()),
    }
}

/// Split `line` into independent statements on `:` at depth zero,
/// i.e. outside quoted strings.
pub fn split_statements(line: &str) -> ScanResult<Vec<String>> {
    let bytes = line.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += find_end_of_string(&line[i..])? + 1;
            }
            b':' => {
                parts.push(line[start..i].trim().to_string());
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(line[start..].trim().to_string());
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_scan_finds_closing_quote() {
        assert_eq!(find_end_of_string(r#""HELLO" REST"#).unwrap(), 6);
    }

    #[test]
    fn string_scan_ignores_escaped_quote() {
        assert_eq!(find_end_of_string(r#""A\"B""#).unwrap(), 5);
    }

    #[test]
    fn string_scan_reports_unterminated() {
        assert_eq!(
            find_end_of_string(r#""HELLO"#).unwrap_err(),
            ScanError::UnterminatedString
        );
    }

    #[test]
    fn bracket_scan_finds_match() {
        assert_eq!(find_end_of_bracket("(1,2)+3").unwrap(), 4);
    }

    #[test]
    fn bracket_scan_handles_nesting() {
        assert_eq!(find_end_of_bracket("((1+2)*3)").unwrap(), 8);
    }

    #[test]
    fn bracket_scan_skips_quoted_parens() {
        assert_eq!(find_end_of_bracket(r#"("a)b")"#).unwrap(), 6);
    }

    #[test]
    fn operand_scan_stops_at_operator() {
        assert_eq!(find_end_of_operand("X+1").unwrap(), 0);
        assert_eq!(find_end_of_operand("X1+1").unwrap(), 1);
    }

    #[test]
    fn operand_scan_consumes_call_parens() {
        assert_eq!(find_end_of_operand("LEN(A$)+1").unwrap(), 6);
    }

    #[test]
    fn operand_scan_rejects_quote() {
        assert_eq!(
            find_end_of_operand(r#"FOO"BAR""#).unwrap_err(),
            ScanError::QuoteInOperand
        );
    }

    #[test]
    fn operand_scan_rejects_stray_close_bracket() {
        assert_eq!(
            find_end_of_operand("X)").unwrap_err(),
            ScanError::UnmatchedCloseBracketInOperand
        );
    }

    #[test]
    fn operand_scan_rejects_reopened_bracket() {
        assert_eq!(
            find_end_of_operand("A(1)(2)").unwrap_err(),
            ScanError::ReopenedBracketInOperand
        );
    }

    #[test]
    fn split_two_handles_absent_separator() {
        assert_eq!(
            split_in_two_on_char("  GOTO  ", ' '),
            SplitTwo::One("GOTO".to_string())
        );
    }

    #[test]
    fn split_two_handles_present_separator() {
        assert_eq!(
            split_in_two_on_char("  LET X = 1  ", ' '),
            SplitTwo::Two("LET".to_string(), "X = 1".to_string())
        );
    }

    #[test]
    fn split_statements_splits_on_colon() {
        assert_eq!(
            split_statements("LET X=1 : PRINT X").unwrap(),
            vec!["LET X=1".to_string(), "PRINT X".to_string()]
        );
    }

    #[test]
    fn split_statements_ignores_colon_in_string() {
        assert_eq!(
            split_statements(r#"PRINT "A:B" : PRINT "C""#).unwrap(),
            vec![r#"PRINT "A:B""#.to_string(), r#"PRINT "C""#.to_string()]
        );
    }
}
