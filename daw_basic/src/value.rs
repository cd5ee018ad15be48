use std::fmt;

use crate::error::{EngineError, EngineResult};

/// The tagged value every variable, constant, array cell, and
/// expression result is an instance of.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Empty,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
}

/// The classification a pair of values reduces to before a binary
/// operator is applied. `Empty` here means "no valid coercion" — it is
/// the same tag as [`Value::Empty`] but used as a sentinel in
/// [`determine_result_type`] rather than a real value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Real,
    String,
    Boolean,
    Empty,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::String(_) => ValueKind::String,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "EMPTY",
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::String(_) => "STRING",
        }
    }

    /// Numeric value for INTEGER/REAL only. Any other type is a FATAL
    /// error — callers are expected to have already rejected
    /// non-numeric types with SYNTAX before reaching here.
    pub fn to_numeric(&self) -> EngineResult<f64> {
        match self {
            Value::Integer(i) => Ok(*i as f64),
            Value::Real(r) => Ok(*r),
            other => Err(EngineError::fatal(format!(
                "to_numeric called on non-numeric value {:?}",
                other
            ))),
        }
    }

    /// Classify a trimmed literal by its textual shape: blank is
    /// Empty; a leading `-` and digits with at most one non-terminal
    /// `.` is Integer or Real; anything else is a String.
    pub fn classify_literal(text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }

        let mut chars = trimmed.chars().peekable();
        let mut saw_digit = false;
        let mut saw_dot = false;
        let mut ok = true;

        if chars.peek() == Some(&'-') {
            chars.next();
        }

        let rest: Vec<char> = chars.collect();
        if rest.is_empty() {
            ok = false;
        }
        for c in &rest {
            if c.is_ascii_digit() {
                saw_digit = true;
            } else if *c == '.' {
                if saw_dot {
                    ok = false;
                    break;
                }
                saw_dot = true;
            } else {
                ok = false;
                break;
            }
        }
        if rest.last() == Some(&'.') {
            ok = false;
        }

        if ok && saw_digit {
            if saw_dot {
                trimmed
                    .parse::<f64>()
                    .map(Value::Real)
                    .unwrap_or_else(|_| Value::String(trimmed.to_string()))
            } else {
                trimmed
                    .parse::<i32>()
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::String(trimmed.to_string()))
            }
        } else {
            Value::String(trimmed.to_string())
        }
    }

    /// Re-parseable literal form, used only for the round-trip
    /// property: strings are quoted and `"` is escaped, matching the
    /// evaluator's own string-literal syntax. Not used for PRINT.
    pub fn to_quoted_literal(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, ""),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

/// The coercion table from spec §4.1: given the kinds of two operands,
/// what kind the operator should coerce both to before applying.
/// `ValueKind::Empty` means "no valid coercion" (a type error).
pub fn determine_result_type(lhs: &Value, rhs: &Value) -> ValueKind {
    use ValueKind::*;
    match (lhs.kind(), rhs.kind()) {
        (Integer, Integer) => Integer,
        (Integer, Real) => Real,
        (Integer, String) => String,
        (Real, Integer) => Real,
        (Real, Real) => Real,
        (Real, String) => String,
        (String, Integer) => String,
        (String, Real) => String,
        (String, String) => String,
        (Boolean, Boolean) => Boolean,
        _ => Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_blank_as_empty() {
        assert_eq!(Value::classify_literal("   "), Value::Empty);
    }

    #[test]
    fn classifies_integer() {
        assert_eq!(Value::classify_literal("42"), Value::Integer(42));
        assert_eq!(Value::classify_literal("-7"), Value::Integer(-7));
    }

    #[test]
    fn classifies_real() {
        assert_eq!(Value::classify_literal("3.5"), Value::Real(3.5));
        assert_eq!(Value::classify_literal("-0.25"), Value::Real(-0.25));
    }

    #[test]
    fn classifies_string() {
        assert_eq!(
            Value::classify_literal("HELLO"),
            Value::String("HELLO".to_string())
        );
        assert_eq!(
            Value::classify_literal("1.2.3"),
            Value::String("1.2.3".to_string())
        );
    }

    #[test]
    fn coercion_table_matches_spec() {
        assert_eq!(
            determine_result_type(&Value::Integer(1), &Value::Real(2.0)),
            ValueKind::Real
        );
        assert_eq!(
            determine_result_type(&Value::Integer(1), &Value::String("x".into())),
            ValueKind::String
        );
        assert_eq!(
            determine_result_type(&Value::Boolean(true), &Value::Integer(1)),
            ValueKind::Empty
        );
        assert_eq!(
            determine_result_type(&Value::Empty, &Value::Empty),
            ValueKind::Empty
        );
    }

    #[test]
    fn quoted_literal_escapes_embedded_quotes() {
        let v = Value::String("HELLO \"WORLD\"".to_string());
        assert_eq!(v.to_quoted_literal(), r#""HELLO \"WORLD\"""#);
    }
}
