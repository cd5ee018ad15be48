//! The shunting-yard expression evaluator (spec §4.3), implemented as
//! methods on [`Engine`] since every lookup bottoms out in the
//! engine's own symbol environment.

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::value::Value;

fn is_unary_minus(operands: &[Value], operators: &[String]) -> bool {
    (operators.is_empty() && operands.is_empty()) || (!operators.is_empty() && operands.len() % 2 == 1)
}

/// `AND`/`OR` are tokenized as keyword operators only when the
/// upper-cased prefix is followed by whitespace or end-of-input, so a
/// variable named e.g. `ANDY` is not mistaken for the `AND` operator.
fn match_keyword_operator(rest: &str) -> Option<(&'static str, usize)> {
    for (word, canonical) in [("AND", "AND"), ("OR", "OR")] {
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word) {
            let boundary = rest[word.len()..].chars().next();
            if boundary.is_none() || boundary.unwrap().is_whitespace() {
                return Some((canonical, word.len()));
            }
        }
    }
    None
}

/// Split `s` on `,` at bracket-depth zero, outside quoted strings.
fn split_comma_list(s: &str) -> EngineResult<Vec<String>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let bytes = trimmed.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += daw_basic_scan::find_end_of_string(&trimmed[i..])? + 1;
                continue;
            }
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(trimmed[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(trimmed[start..].trim().to_string());
    Ok(parts)
}

impl Engine {
    /// Evaluate a BASIC expression fragment to a single [`Value`].
    pub fn evaluate(&mut self, text: &str) -> EngineResult<Value> {
        let mut operands: Vec<Value> = Vec::new();
        let mut operators: Vec<String> = Vec::new();
        let bytes = text.as_bytes();
        let mut i = 0usize;

        while i < bytes.len() {
            let c = bytes[i] as char;

            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if c == '"' {
                let end = daw_basic_scan::find_end_of_string(&text[i..])?;
                let raw = &text[i + 1..i + end];
                operands.push(Value::String(raw.replace("\\\"", "\"")));
                i += end + 1;
                continue;
            }

            if c == '(' {
                let end = daw_basic_scan::find_end_of_bracket(&text[i..])?;
                let inner = &text[i + 1..i + end];
                operands.push(self.evaluate(inner)?);
                i += end + 1;
                continue;
            }

            if c.is_ascii_alphabetic() {
                if let Some((op, len)) = match_keyword_operator(&text[i..]) {
                    self.reduce_pending(op, &mut operators, &mut operands)?;
                    operators.push(op.to_string());
                    i += len;
                    continue;
                }
            }

            if "%^*/+-<>=".contains(c) {
                let (op, len) = if c == '-' && is_unary_minus(&operands, &operators) {
                    ("NEG".to_string(), 1)
                } else if (c == '<' || c == '>') && text.as_bytes().get(i + 1) == Some(&b'=') {
                    (format!("{c}="), 2)
                } else {
                    (c.to_string(), 1)
                };
                self.reduce_pending(&op, &mut operators, &mut operands)?;
                operators.push(op);
                i += len;
                continue;
            }

            let end = daw_basic_scan::find_end_of_operand(&text[i..])?;
            let token = &text[i..=i + end];
            let value = self.evaluate_operand_token(token)?;
            operands.push(value);
            i += end + 1;
        }

        while let Some(op) = operators.pop() {
            self.apply_operator(&op, &mut operands)?;
        }

        operands
            .pop()
            .ok_or_else(|| EngineError::syntax("empty expression"))
    }

    pub(crate) fn evaluate_comma_list(&mut self, s: &str) -> EngineResult<Vec<Value>> {
        split_comma_list(s)?.iter().map(|p| self.evaluate(p)).collect()
    }

    fn evaluate_operand_token(&mut self, token: &str) -> EngineResult<Value> {
        if let Some(paren_idx) = token.find('(') {
            let name = &token[..paren_idx];
            let inner = &token[paren_idx + 1..token.len() - 1];
            let args = self.evaluate_comma_list(inner)?;

            if name.eq_ignore_ascii_case("RND") {
                return Ok(Value::Real(self.rng.next_real()));
            }
            if self.env.is_function(name) {
                let f = self.env.function(name).unwrap().callable;
                return f(&args);
            }
            if self.env.is_array(name) {
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
                return self.env.array(name).unwrap().get(&indices).map(|v| v.clone());
            }
            return Err(EngineError::syntax(format!("'{name}' is not a function or array")));
        }

        match Value::classify_literal(token) {
            Value::Integer(i) => Ok(Value::Integer(i)),
            Value::Real(r) => Ok(Value::Real(r)),
            _ => self.env.get_variable_constant(token),
        }
    }

    fn operator_precedence(&self, op: &str) -> u8 {
        if op == "NEG" {
            self.env.unary_operator("NEG").map(|e| e.precedence).unwrap_or(1)
        } else {
            self.env.binary_operator(op).map(|e| e.precedence).unwrap_or(u8::MAX)
        }
    }

    fn should_reduce(&self, new_op: &str, top_op: &str) -> bool {
        if new_op == "^" && top_op == "^" {
            // right-associative: don't let a pending `^` reduce against
            // another `^` about to be pushed.
            return false;
        }
        self.operator_precedence(new_op) >= self.operator_precedence(top_op)
    }

    fn reduce_pending(
        &mut self,
        new_op: &str,
        operators: &mut Vec<String>,
        operands: &mut Vec<Value>,
    ) -> EngineResult<()> {
        while let Some(top) = operators.last() {
            if self.should_reduce(new_op, top) {
                let top = operators.pop().unwrap();
                self.apply_operator(&top, operands)?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn apply_operator(&mut self, op: &str, operands: &mut Vec<Value>) -> EngineResult<()> {
        if op == "NEG" {
            let v = operands
                .pop()
                .ok_or_else(|| EngineError::syntax("NEG: missing operand"))?;
            let entry = *self
                .env
                .unary_operator("NEG")
                .ok_or_else(|| EngineError::fatal("NEG operator not registered"))?;
            operands.push((entry.callable)(&v)?);
        } else {
            let entry = *self
                .env
                .binary_operator(op)
                .ok_or_else(|| EngineError::fatal(format!("unknown operator '{op}'")))?;
            let right = operands
                .pop()
                .ok_or_else(|| EngineError::syntax(format!("'{op}': missing right operand")))?;
            let left = operands
                .pop()
                .ok_or_else(|| EngineError::syntax(format!("'{op}': missing left operand")))?;
            operands.push((entry.callable)(&left, &right)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use pretty_assertions::assert_eq;

    #[test]
    fn precedence_matches_spec_examples() {
        let mut e = Engine::new();
        assert_eq!(e.evaluate("1+2*3").unwrap(), Value::Integer(7));
        assert_eq!(e.evaluate("(1+2)*3").unwrap(), Value::Integer(9));
    }

    #[test]
    fn power_is_right_associative() {
        let mut e = Engine::new();
        assert_eq!(e.evaluate("2^3^2").unwrap(), Value::Integer(512));
    }

    #[test]
    fn unary_minus_at_start_of_expression() {
        let mut e = Engine::new();
        assert_eq!(e.evaluate("-5+3").unwrap(), Value::Integer(-2));
    }

    #[test]
    fn unary_minus_after_binary_operator() {
        let mut e = Engine::new();
        assert_eq!(e.evaluate("3*-2").unwrap(), Value::Integer(-6));
    }

    #[test]
    fn string_concatenation_and_function_calls() {
        let mut e = Engine::new();
        assert_eq!(
            e.evaluate(r#"LEFT$("HELLO",3)"#).unwrap(),
            Value::String("HEL".into())
        );
    }

    #[test]
    fn and_or_are_recognised_as_operators() {
        let mut e = Engine::new();
        assert_eq!(e.evaluate("TRUE AND FALSE").unwrap(), Value::Boolean(false));
        assert_eq!(e.evaluate("TRUE OR FALSE").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn and_like_variable_name_is_not_confused_with_operator() {
        let mut e = Engine::new();
        e.set_variable("ANDY", Value::Integer(9)).unwrap();
        assert_eq!(e.evaluate("ANDY").unwrap(), Value::Integer(9));
    }
}
