//! Statement dispatch (spec §4.5): classify a line as a program-store
//! edit or an immediate statement, split statements on `:`, and route
//! each to a keyword handler or implicit `LET`.

use crate::engine::{Engine, RunMode};
use crate::error::{EngineError, EngineResult};
use crate::value::Value;

fn split_head_rest(s: &str) -> (String, String) {
    match s.find(char::is_whitespace) {
        Some(idx) => (s[..idx].to_string(), s[idx..].trim_start().to_string()),
        None => (s.to_string(), String::new()),
    }
}

impl Engine {
    /// The REPL's entry point: dispatch one input line, optionally
    /// printing the `READY` banner afterward. Returns `false` when the
    /// REPL should stop.
    pub fn parse_line(&mut self, text: &str, show_ready: bool) -> bool {
        let cont = self.dispatch_line(text);
        if show_ready && cont && matches!(self.run_mode, RunMode::Immediate) {
            println!("READY");
        }
        cont
    }

    pub(crate) fn dispatch_line(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return true;
        }

        let (head, rest) = split_head_rest(trimmed);
        if let Ok(n) = head.parse::<i32>() {
            if n < 0 {
                println!("SYNTAX ERROR: line number must be non-negative");
                self.has_syntax_error = true;
                return true;
            }
            if rest.trim().is_empty() {
                self.remove_line(n);
            } else {
                self.add_line(n, rest.trim().to_string());
            }
            return true;
        }

        let statements = match daw_basic_scan::split_statements(trimmed) {
            Ok(s) => s,
            Err(e) => {
                println!("SYNTAX ERROR: {e}");
                self.has_syntax_error = true;
                return true;
            }
        };

        for stmt in statements {
            if stmt.trim().is_empty() {
                continue;
            }
            match self.dispatch_statement(&stmt) {
                Ok(cont) => {
                    if self.exiting || !cont {
                        return cont;
                    }
                }
                Err(e) if e.is_fatal() => {
                    println!("{e}");
                    return false;
                }
                Err(e) => {
                    println!("{e}");
                    self.has_syntax_error = true;
                    return true;
                }
            }
        }
        true
    }

    pub(crate) fn dispatch_statement(&mut self, stmt: &str) -> EngineResult<bool> {
        let (head, rest) = split_head_rest(stmt.trim());
        let callable = self.env.keyword(&head.to_ascii_uppercase()).map(|k| k.callable);
        match callable {
            Some(f) => f(self, rest.trim()),
            None => self.let_helper(stmt, false),
        }
    }

    /// Treat `statement` as `VAR = EXPR` (or `ARR(i[,j]) = EXPR`), the
    /// implicit-assignment form used both by the bare fallback in
    /// dispatch and by the explicit `LET` keyword.
    pub(crate) fn let_helper(&mut self, statement: &str, show_error: bool) -> EngineResult<bool> {
        match daw_basic_scan::split_in_two_on_char(statement, '=') {
            daw_basic_scan::SplitTwo::Two(lhs, rhs) => {
                self.assign(&lhs, &rhs)?;
                Ok(true)
            }
            daw_basic_scan::SplitTwo::One(_) => {
                if show_error {
                    Err(EngineError::syntax("expected 'variable = expression'"))
                } else {
                    Err(EngineError::syntax(format!(
                        "unrecognised statement '{statement}'"
                    )))
                }
            }
        }
    }

    fn assign(&mut self, lhs: &str, rhs: &str) -> EngineResult<()> {
        let value = self.evaluate(rhs)?;
        let lhs = lhs.trim();

        if let Some(paren_idx) = lhs.find('(') {
            if !lhs.ends_with(')') {
                return Err(EngineError::syntax("malformed array assignment"));
            }
            let name = &lhs[..paren_idx];
            let inner = &lhs[paren_idx + 1..lhs.len() - 1];
            let args = self.evaluate_comma_list(inner)?;
            let indices: EngineResult<Vec<i32>> = args
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Ok(*i),
                    other => Err(EngineError::syntax(format!(
                        "array index must be INTEGER, got {}",
                        other.type_name()
                    ))),
                })
                .collect();
            let indices = indices?;
            let array = self
                .env
                .array_mut(name)
                .ok_or_else(|| EngineError::syntax(format!("undefined array '{name}'")))?;
            array.set(&indices, value)
        } else {
            self.env.set_variable(lhs, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbered_line_is_stored_not_executed() {
        let mut e = Engine::new();
        assert!(e.parse_line("10 PRINT 1", false));
        assert_eq!(e.list_program(), "10\tPRINT 1");
    }

    #[test]
    fn numbered_line_with_empty_rest_deletes() {
        let mut e = Engine::new();
        e.parse_line("10 PRINT 1", false);
        e.parse_line("10", false);
        assert_eq!(e.list_program(), "");
    }

    #[test]
    fn implicit_let_is_case_insensitive() {
        let mut e = Engine::new();
        e.parse_line("X=1", false);
        assert_eq!(e.get_variable_constant("x").unwrap(), Value::Integer(1));
    }

    #[test]
    fn array_round_trip_through_statements() {
        let mut e = Engine::new();
        e.parse_line("DIM A(3)", false);
        e.parse_line("LET A(0)=10 : LET A(1)=7", false);
        assert_eq!(e.evaluate("A(0)+A(1)").unwrap(), Value::Integer(17));
    }

    #[test]
    fn unknown_statement_is_syntax_error_but_keeps_repl_alive() {
        let mut e = Engine::new();
        assert!(e.parse_line("FROBNICATE", false));
    }
}
